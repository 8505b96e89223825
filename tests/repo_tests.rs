use hostel::{
    models::{NewMenuEntry, NewPost, NewUser},
    repo::{sqlite::SqliteRepo, RepoError},
};
// Bring trait method namespaces into scope so calls on SqliteRepo resolve.
use hostel::repo::{ComplaintRepo, LostFoundRepo, MenuRepo, UserRepo};
use tempfile::TempDir;

/// Fresh database file per test; the TempDir must outlive the repo.
async fn repo() -> (TempDir, SqliteRepo) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("hostel.db").display());
    let repo = SqliteRepo::connect(&url).await.unwrap();
    (dir, repo)
}

fn new_user(username: &str, name: &str) -> NewUser {
    NewUser {
        username: username.into(),
        password_hash: "$argon2id$placeholder".into(),
        role: "student".into(),
        name: name.into(),
    }
}

#[tokio::test]
async fn user_create_find_and_conflict() {
    let (_dir, r) = repo().await;

    assert!(r.find_user_by_username("bob").await.unwrap().is_none());

    let u = r.create_user(new_user("bob", "Bob Builder")).await.unwrap();
    assert!(u.id > 0);

    let found = r.find_user_by_username("bob").await.unwrap().unwrap();
    assert_eq!(found.id, u.id);
    assert_eq!(found.name, "Bob Builder");
    assert_eq!(found.password_hash, "$argon2id$placeholder");

    // duplicate username → conflict
    let err = r.create_user(new_user("bob", "Other Bob")).await.unwrap_err();
    assert!(matches!(err, RepoError::Conflict));
}

#[tokio::test]
async fn insert_if_absent_is_idempotent() {
    let (_dir, r) = repo().await;
    assert!(r.insert_user_if_absent(new_user("warden", "Hostel Warden")).await.unwrap());
    assert!(!r.insert_user_if_absent(new_user("warden", "Someone Else")).await.unwrap());
    let w = r.find_user_by_username("warden").await.unwrap().unwrap();
    assert_eq!(w.name, "Hostel Warden");
}

#[tokio::test]
async fn lost_found_lists_newest_first_with_names() {
    let (_dir, r) = repo().await;
    let alice = r.create_user(new_user("alice", "Alice Student")).await.unwrap();
    let bob = r.create_user(new_user("bob", "Bob Builder")).await.unwrap();

    let first = r
        .create_lost_found(NewPost { user_id: alice.id, caption: "blue umbrella".into(), image_path: "a.png".into() })
        .await
        .unwrap();
    let second = r
        .create_lost_found(NewPost { user_id: bob.id, caption: "keys".into(), image_path: "b.png".into() })
        .await
        .unwrap();

    let posts = r.list_lost_found().await.unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].id, second);
    assert_eq!(posts[0].user_name, "Bob Builder");
    assert_eq!(posts[1].id, first);
    assert_eq!(posts[1].caption, "blue umbrella");
    assert!(posts[0].created_at >= posts[1].created_at);
}

#[tokio::test]
async fn posts_do_not_require_an_existing_user() {
    let (_dir, r) = repo().await;
    // accepted by the store, but the join hides it from listings
    r.create_lost_found(NewPost { user_id: 999, caption: "ghost".into(), image_path: "g.png".into() })
        .await
        .unwrap();
    assert!(r.list_lost_found().await.unwrap().is_empty());
}

#[tokio::test]
async fn complaints_default_to_pending() {
    let (_dir, r) = repo().await;
    let alice = r.create_user(new_user("alice", "Alice Student")).await.unwrap();
    r.create_complaint(NewPost { user_id: alice.id, caption: "leaky tap".into(), image_path: "t.png".into() })
        .await
        .unwrap();

    for _ in 0..2 {
        let list = r.list_complaints().await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].status, "pending");
        assert_eq!(list[0].username, "alice");
        assert_eq!(list[0].user_name, "Alice Student");
    }
}

#[tokio::test]
async fn menu_current_is_most_recent() {
    let (_dir, r) = repo().await;
    assert!(r.current_menu().await.unwrap().is_none());

    let err = r.update_current_menu_text("nothing yet").await.unwrap_err();
    assert!(matches!(err, RepoError::NotFound));

    let first = r
        .create_menu_entry(NewMenuEntry { image_path: "m1.png".into(), today_update: "".into() })
        .await
        .unwrap();
    assert_eq!(r.current_menu().await.unwrap().unwrap().id, first);

    let second = r
        .create_menu_entry(NewMenuEntry { image_path: "m2.png".into(), today_update: "rice".into() })
        .await
        .unwrap();
    let current = r.current_menu().await.unwrap().unwrap();
    assert_eq!(current.id, second);
    assert_eq!(current.today_update, "rice");

    let updated = r.update_current_menu_text("rice and dal").await.unwrap();
    assert_eq!(updated.id, second);
    assert_eq!(updated.image_path, "m2.png");
    assert!(updated.updated_at >= current.updated_at);

    let current = r.current_menu().await.unwrap().unwrap();
    assert_eq!(current.id, second);
    assert_eq!(current.today_update, "rice and dal");

    // the older entry is untouched
    let (old_text,): (String,) = sqlx::query_as("SELECT today_update FROM menu WHERE id = ?")
        .bind(first)
        .fetch_one(r.pool())
        .await
        .unwrap();
    assert_eq!(old_text, "");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_menu_text_edits_all_succeed() {
    let (_dir, r) = repo().await;
    let id = r
        .create_menu_entry(NewMenuEntry { image_path: "m.png".into(), today_update: "".into() })
        .await
        .unwrap();
    let r = std::sync::Arc::new(r);

    let handles: Vec<_> = (0..40)
        .map(|i| {
            let r = r.clone();
            tokio::spawn(async move { r.update_current_menu_text(&format!("special #{i}")).await })
        })
        .collect();
    for h in handles {
        let entry = h.await.unwrap().expect("concurrent edit failed");
        assert_eq!(entry.id, id);
        assert_eq!(entry.image_path, "m.png");
    }

    let current = r.current_menu().await.unwrap().unwrap();
    assert_eq!(current.id, id);
    assert!(current.today_update.starts_with("special #"));
}
