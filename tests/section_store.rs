use biopage::core::access::Actor;
use biopage::core::broker::StoreBroker;
use biopage::core::content::{ContentRegistry, SectionContent, SectionKind};
use biopage::core::db;
use biopage::core::error::BiopageError;
use biopage::core::profile::{Profile, ProfileStore};
use biopage::core::section::{SectionPatch, SectionStore};
use serde_json::json;
use tempfile::TempDir;

fn setup() -> (TempDir, StoreBroker) {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path().join("data");
    db::initialize_pages_db(&root).expect("init db");
    (tmp, StoreBroker::new(&root))
}

fn profile_for(broker: &StoreBroker, owner: &str, username: &str) -> Profile {
    ProfileStore::new(broker)
        .create_profile(&Actor::user(owner), username, None)
        .expect("create profile")
}

#[test]
fn create_with_default_content_seeds_text_list() {
    let (_tmp, broker) = setup();
    let profile = profile_for(&broker, "acct_a", "alice");
    let store = SectionStore::new(&broker, ContentRegistry::new());
    let actor = Actor::user("acct_a");

    let section = store
        .create_section(&actor, &profile.id, "Reading", SectionKind::TextList, None, None)
        .expect("create");
    assert_eq!(section.position, 0);
    assert!(section.visible);
    match &section.content {
        SectionContent::TextList { items } => {
            assert!(!items.is_empty());
            assert!(items.iter().all(|s| !s.is_empty()));
        }
        other => panic!("wrong variant: {other:?}"),
    }

    let listed = store.list_all(&actor, &profile.id).expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].content, section.content);
}

#[test]
fn position_defaults_to_append() {
    let (_tmp, broker) = setup();
    let profile = profile_for(&broker, "acct_a", "alice");
    let store = SectionStore::new(&broker, ContentRegistry::new());
    let actor = Actor::user("acct_a");

    let first = store
        .create_section(&actor, &profile.id, "One", SectionKind::TextList, None, None)
        .expect("first");
    let second = store
        .create_section(&actor, &profile.id, "Two", SectionKind::Gallery, None, None)
        .expect("second");
    assert_eq!(first.position, 0);
    assert_eq!(second.position, 1);
}

#[test]
fn explicit_content_is_validated_and_normalized() {
    let (_tmp, broker) = setup();
    let profile = profile_for(&broker, "acct_a", "alice");
    let store = SectionStore::new(&broker, ContentRegistry::new());
    let actor = Actor::user("acct_a");

    let raw = json!({"links": [{"title": "Site", "url": "https://x.test", "extra": 1}]});
    let section = store
        .create_section(&actor, &profile.id, "Links", SectionKind::Links, Some(&raw), None)
        .expect("create");
    assert_eq!(
        section.content.to_json(),
        json!({"links": [{"title": "Site", "url": "https://x.test"}]})
    );

    let bad = json!({"links": [{"title": "No url"}]});
    let err = store
        .create_section(&actor, &profile.id, "Bad", SectionKind::Links, Some(&bad), None)
        .unwrap_err();
    match err {
        BiopageError::InvalidContent { field, .. } => assert_eq!(field, "links[0].url"),
        other => panic!("expected InvalidContent, got {other:?}"),
    }
}

#[test]
fn list_visible_orders_by_position_then_creation() {
    let (_tmp, broker) = setup();
    let profile = profile_for(&broker, "acct_a", "alice");
    let store = SectionStore::new(&broker, ContentRegistry::new());
    let actor = Actor::user("acct_a");

    let s1 = store
        .create_section(&actor, &profile.id, "First at 5", SectionKind::TextList, None, Some(5))
        .expect("s1");
    let s2 = store
        .create_section(&actor, &profile.id, "Second at 5", SectionKind::TextList, None, Some(5))
        .expect("s2");
    let s3 = store
        .create_section(&actor, &profile.id, "At 1", SectionKind::TextList, None, Some(1))
        .expect("s3");

    let visible = store.list_visible(&profile.id).expect("list");
    let ids: Vec<&str> = visible.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec![s3.id.as_str(), s1.id.as_str(), s2.id.as_str()]);
}

#[test]
fn hiding_a_section_removes_it_from_the_public_list_only() {
    let (_tmp, broker) = setup();
    let profile = profile_for(&broker, "acct_a", "alice");
    let store = SectionStore::new(&broker, ContentRegistry::new());
    let actor = Actor::user("acct_a");

    let raw = json!({"links": [{"title": "Site", "url": "https://x.test"}]});
    let section = store
        .create_section(&actor, &profile.id, "Links", SectionKind::Links, Some(&raw), None)
        .expect("create");

    let updated = store
        .update_section(
            &actor,
            &section.id,
            &SectionPatch {
                visible: Some(false),
                ..Default::default()
            },
        )
        .expect("hide");
    assert!(!updated.visible);
    assert_eq!(updated.content, section.content, "content untouched by visibility patch");

    assert!(store.list_visible(&profile.id).expect("visible").is_empty());
    assert_eq!(store.list_all(&actor, &profile.id).expect("all").len(), 1);
}

#[test]
fn update_revalidates_content_under_the_existing_kind() {
    let (_tmp, broker) = setup();
    let profile = profile_for(&broker, "acct_a", "alice");
    let store = SectionStore::new(&broker, ContentRegistry::new());
    let actor = Actor::user("acct_a");

    let section = store
        .create_section(&actor, &profile.id, "Links", SectionKind::Links, None, None)
        .expect("create");

    let err = store
        .update_section(
            &actor,
            &section.id,
            &SectionPatch {
                content: Some(json!({"links": [{"title": 42, "url": "https://x.test"}]})),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, BiopageError::InvalidContent { .. }), "{err}");

    // The kind column never changes; a payload shaped for another variant
    // normalizes to this variant's empty default instead of migrating it.
    let updated = store
        .update_section(
            &actor,
            &section.id,
            &SectionPatch {
                content: Some(json!({"images": [{"url": "https://img.test/a.png"}]})),
                ..Default::default()
            },
        )
        .expect("update");
    assert_eq!(updated.kind, SectionKind::Links);
    assert_eq!(updated.content, SectionContent::Links { links: vec![] });
}

#[test]
fn delete_is_hard_and_second_delete_is_not_found() {
    let (_tmp, broker) = setup();
    let profile = profile_for(&broker, "acct_a", "alice");
    let store = SectionStore::new(&broker, ContentRegistry::new());
    let actor = Actor::user("acct_a");

    let section = store
        .create_section(&actor, &profile.id, "Gone soon", SectionKind::Gallery, None, None)
        .expect("create");
    store.delete_section(&actor, &section.id).expect("delete");

    let err = store.delete_section(&actor, &section.id).unwrap_err();
    assert!(matches!(err, BiopageError::NotFound(_)), "{err}");
}

#[test]
fn reorder_is_total_and_idempotent() {
    let (_tmp, broker) = setup();
    let profile = profile_for(&broker, "acct_a", "alice");
    let store = SectionStore::new(&broker, ContentRegistry::new());
    let actor = Actor::user("acct_a");

    let mut ids = Vec::new();
    for title in ["a", "b", "c"] {
        ids.push(
            store
                .create_section(&actor, &profile.id, title, SectionKind::TextList, None, None)
                .expect("create")
                .id,
        );
    }

    let reversed: Vec<String> = ids.iter().rev().cloned().collect();
    store.reorder(&actor, &profile.id, &reversed).expect("reorder");
    let after: Vec<String> = store
        .list_all(&actor, &profile.id)
        .expect("list")
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(after, reversed);

    store.reorder(&actor, &profile.id, &reversed).expect("reorder again");
    let again: Vec<String> = store
        .list_all(&actor, &profile.id)
        .expect("list")
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(again, reversed, "second identical reorder changes nothing");
}

#[test]
fn reorder_mismatch_leaves_positions_untouched() {
    let (_tmp, broker) = setup();
    let profile = profile_for(&broker, "acct_a", "alice");
    let store = SectionStore::new(&broker, ContentRegistry::new());
    let actor = Actor::user("acct_a");

    let mut ids = Vec::new();
    for title in ["a", "b", "c"] {
        ids.push(
            store
                .create_section(&actor, &profile.id, title, SectionKind::TextList, None, None)
                .expect("create")
                .id,
        );
    }
    let before: Vec<(String, i64)> = store
        .list_all(&actor, &profile.id)
        .expect("list")
        .into_iter()
        .map(|s| (s.id, s.position))
        .collect();

    let partial = vec![ids[2].clone(), ids[0].clone()];
    let err = store.reorder(&actor, &profile.id, &partial).unwrap_err();
    assert!(matches!(err, BiopageError::ReorderMismatch(_)), "{err}");

    let foreign = vec![ids[2].clone(), ids[0].clone(), "sec_not_ours".to_string()];
    let err = store.reorder(&actor, &profile.id, &foreign).unwrap_err();
    assert!(matches!(err, BiopageError::ReorderMismatch(_)), "{err}");

    let duplicated = vec![ids[0].clone(), ids[0].clone(), ids[1].clone()];
    let err = store.reorder(&actor, &profile.id, &duplicated).unwrap_err();
    assert!(matches!(err, BiopageError::ReorderMismatch(_)), "{err}");

    let after: Vec<(String, i64)> = store
        .list_all(&actor, &profile.id)
        .expect("list")
        .into_iter()
        .map(|s| (s.id, s.position))
        .collect();
    assert_eq!(after, before, "failed reorders must not move anything");
}

#[test]
fn cross_owner_mutations_are_unauthorized_and_change_nothing() {
    let (_tmp, broker) = setup();
    let profile_a = profile_for(&broker, "acct_a", "alice");
    profile_for(&broker, "acct_b", "bob");
    let store = SectionStore::new(&broker, ContentRegistry::new());
    let owner = Actor::user("acct_a");
    let intruder = Actor::user("acct_b");

    let section = store
        .create_section(&owner, &profile_a.id, "Mine", SectionKind::TextList, None, None)
        .expect("create");

    let err = store
        .update_section(
            &intruder,
            &section.id,
            &SectionPatch {
                title: Some("Stolen".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, BiopageError::Unauthorized(_)), "{err}");

    let err = store.delete_section(&intruder, &section.id).unwrap_err();
    assert!(matches!(err, BiopageError::Unauthorized(_)), "{err}");

    let err = store
        .reorder(&intruder, &profile_a.id, &[section.id.clone()])
        .unwrap_err();
    assert!(matches!(err, BiopageError::Unauthorized(_)), "{err}");

    let err = store.list_all(&intruder, &profile_a.id).unwrap_err();
    assert!(matches!(err, BiopageError::Unauthorized(_)), "{err}");

    let unchanged = store.list_all(&owner, &profile_a.id).expect("list");
    assert_eq!(unchanged.len(), 1);
    assert_eq!(unchanged[0].title, "Mine");
}

#[test]
fn anonymous_mutation_is_unauthenticated() {
    let (_tmp, broker) = setup();
    let profile = profile_for(&broker, "acct_a", "alice");
    let store = SectionStore::new(&broker, ContentRegistry::new());

    let err = store
        .create_section(&Actor::Anonymous, &profile.id, "X", SectionKind::TextList, None, None)
        .unwrap_err();
    assert!(matches!(err, BiopageError::Unauthenticated), "{err}");
}

#[test]
fn creating_under_a_missing_profile_is_not_found() {
    let (_tmp, broker) = setup();
    let store = SectionStore::new(&broker, ContentRegistry::new());
    let err = store
        .create_section(
            &Actor::user("acct_a"),
            "prof_missing",
            "X",
            SectionKind::TextList,
            None,
            None,
        )
        .unwrap_err();
    assert!(matches!(err, BiopageError::NotFound(_)), "{err}");
}

#[test]
fn sections_cascade_with_their_profile() {
    let (_tmp, broker) = setup();
    let profile = profile_for(&broker, "acct_a", "alice");
    let store = SectionStore::new(&broker, ContentRegistry::new());
    let actor = Actor::user("acct_a");
    store
        .create_section(&actor, &profile.id, "One", SectionKind::TextList, None, None)
        .expect("create");

    broker
        .with_conn("test", "test.cascade", |conn| {
            conn.execute("DELETE FROM profiles WHERE id = ?1", [profile.id.as_str()])?;
            Ok(())
        })
        .expect("raw delete");

    assert!(store.list_visible(&profile.id).expect("list").is_empty());
}
