//! End-to-end flows through the services against a real SQLite file.

mod common;

use std::collections::HashSet;

use paddock::error::AppError;
use paddock::profiles::{ProfileExtras, ProfilePatch};
use paddock::social::ListWindow;
use paddock::videos::NewVideo;

use common::{profile_id, test_state, test_state_with};

fn video(profile_id: &str, title: &str) -> NewVideo {
    NewVideo {
        profile_id: profile_id.to_string(),
        youtube_url: "https://youtu.be/abc123".into(),
        title: title.into(),
        description: String::new(),
        is_public: true,
    }
}

#[tokio::test]
async fn claimed_handle_is_read_back_with_lowercase_projection() {
    let (state, _tmp) = test_state();

    for (user, handle) in [("u1", "Racer_99"), ("u2", "pit.crew"), ("u3", "ABC")] {
        state
            .profiles
            .claim_handle(user, handle, ProfileExtras::default())
            .await
            .unwrap();
        let profile = state.profiles.get_profile(user).await.unwrap();
        assert_eq!(profile.handle.as_deref(), Some(handle));
        assert_eq!(profile.handle_lower, Some(handle.to_lowercase()));
    }
}

#[tokio::test]
async fn handle_availability_excludes_owner() {
    let (state, _tmp) = test_state();
    state
        .profiles
        .claim_handle("U", "Racer_99", ProfileExtras::default())
        .await
        .unwrap();

    assert!(!state.profiles.is_handle_available("racer_99", None).await.unwrap());
    assert!(state
        .profiles
        .is_handle_available("racer_99", Some("U"))
        .await
        .unwrap());
    assert!(!state
        .profiles
        .is_handle_available("RACER_99", Some("someone-else"))
        .await
        .unwrap());
}

#[tokio::test]
async fn claim_merges_extra_fields() {
    let (state, _tmp) = test_state();
    let profile = state
        .profiles
        .claim_handle(
            "u1",
            "late_braker",
            ProfileExtras {
                marketing_opt_in: Some(true),
                comments_require_approval: Some(false),
                comments_friends_only: None,
            },
        )
        .await
        .unwrap();

    assert!(profile.marketing_opt_in);
    assert!(!profile.comments_require_approval);
    assert!(!profile.comments_friends_only);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_claims_have_one_winner() {
    let (state, _tmp) = test_state();
    state.profiles.ensure_profile("a").await.unwrap();
    state.profiles.ensure_profile("b").await.unwrap();

    for round in 0..5 {
        let handle = format!("contested_{round}");
        let (first, second) = tokio::join!(
            {
                let profiles = state.profiles.clone();
                let handle = handle.clone();
                tokio::spawn(async move {
                    profiles
                        .claim_handle("a", &handle, ProfileExtras::default())
                        .await
                })
            },
            {
                let profiles = state.profiles.clone();
                let handle = handle.clone();
                tokio::spawn(async move {
                    profiles
                        .claim_handle("b", &handle, ProfileExtras::default())
                        .await
                })
            }
        );
        let results = [first.unwrap(), second.unwrap()];

        let winners = results.iter().filter(|r| r.is_ok()).count();
        let taken = results
            .iter()
            .filter(|r| matches!(r, Err(AppError::HandleTaken)))
            .count();
        assert_eq!((winners, taken), (1, 1), "round {round}: {results:?}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn profile_edits_racing_a_claim_keep_the_claimed_handle() {
    let (state, _tmp) = test_state();
    state
        .profiles
        .claim_handle("u1", "racer_0", ProfileExtras::default())
        .await
        .unwrap();

    for round in 1..=20 {
        let handle = format!("racer_{round}");
        let name = format!("Driver {round}");
        let (claimed, updated) = tokio::join!(
            {
                let profiles = state.profiles.clone();
                let handle = handle.clone();
                tokio::spawn(async move {
                    profiles
                        .claim_handle("u1", &handle, ProfileExtras::default())
                        .await
                })
            },
            {
                let profiles = state.profiles.clone();
                let patch = ProfilePatch {
                    display_name: Some(name.clone()),
                    ..Default::default()
                };
                tokio::spawn(async move { profiles.update_profile("u1", patch).await })
            }
        );
        claimed.unwrap().unwrap();
        updated.unwrap().unwrap();

        let profile = state.profiles.get_profile("u1").await.unwrap();
        assert_eq!(profile.handle.as_deref(), Some(handle.as_str()), "round {round}");
        assert_eq!(profile.display_name.as_deref(), Some(name.as_str()), "round {round}");
    }
}

#[tokio::test]
async fn display_name_edit_ignores_a_released_handle() {
    let (state, _tmp) = test_state();
    let extras = ProfileExtras::default;
    state.profiles.claim_handle("u1", "old_lap", extras()).await.unwrap();
    state.profiles.claim_handle("u1", "new_lap", extras()).await.unwrap();
    state.profiles.claim_handle("u2", "old_lap", extras()).await.unwrap();

    let profile = state
        .profiles
        .update_profile(
            "u1",
            ProfilePatch {
                display_name: Some("Pole Sitter".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(profile.handle.as_deref(), Some("new_lap"));
    assert_eq!(profile.display_name.as_deref(), Some("Pole Sitter"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_contact_creates_one_profile() {
    let (state, _tmp) = test_state();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let profiles = state.profiles.clone();
            tokio::spawn(async move { profiles.ensure_profile("newcomer").await })
        })
        .collect();

    let mut ids = HashSet::new();
    for task in tasks {
        ids.insert(task.await.unwrap().unwrap().id);
    }
    assert_eq!(ids.len(), 1);

    let count: i64 = state
        .db
        .get()
        .unwrap()
        .query_row(
            "SELECT COUNT(*) FROM profiles WHERE user_id = 'newcomer'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn follow_and_unfollow_are_idempotent() {
    let (state, _tmp) = test_state();
    state.profiles.ensure_profile("a").await.unwrap();
    state.profiles.ensure_profile("b").await.unwrap();

    state.social.follow("a", "b").await.unwrap();
    let again = state.social.follow("a", "b").await.unwrap();
    assert!(again.following);

    let followers = state
        .social
        .list_followers("b", ListWindow::default())
        .await
        .unwrap();
    assert_eq!(followers.len(), 1);
    assert_eq!(followers[0].user_id, "a");
    assert_eq!(state.profiles.get_profile("b").await.unwrap().followers_count, 1);
    assert_eq!(state.profiles.get_profile("a").await.unwrap().following_count, 1);

    state.social.unfollow("a", "b").await.unwrap();
    let again = state.social.unfollow("a", "b").await.unwrap();
    assert!(!again.following);

    assert!(!state.social.is_following("a", "b").await.unwrap());
    assert!(state
        .social
        .list_following("a", ListWindow::default())
        .await
        .unwrap()
        .is_empty());
    assert_eq!(state.profiles.get_profile("b").await.unwrap().followers_count, 0);

    assert!(matches!(
        state.social.follow("a", "a").await,
        Err(AppError::SelfFollow)
    ));
}

#[tokio::test]
async fn toggle_like_parity() {
    let (state, _tmp) = test_state();
    let pid = profile_id(&state, "owner").await;
    let v = state.videos.create_video("owner", video(&pid, "Heat 1")).await.unwrap();

    let first = state.videos.toggle_like(&v.id, "fan").await.unwrap();
    assert!(first.liked);
    assert_eq!(first.likes_count, 1);

    let second = state.videos.toggle_like(&v.id, "fan").await.unwrap();
    assert!(!second.liked);
    assert_eq!(second.likes_count, 0);

    let third = state.videos.toggle_like(&v.id, "fan").await.unwrap();
    assert!(third.liked);
    assert_eq!(third.likes_count, 1);
    assert!(state.videos.is_liked(&v.id, "fan").await.unwrap());

    assert!(matches!(
        state.videos.toggle_like("no-such-video", "fan").await,
        Err(AppError::NotFound)
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn double_submitted_likes_never_go_negative() {
    let (state, _tmp) = test_state();
    let pid = profile_id(&state, "owner").await;
    let v = state.videos.create_video("owner", video(&pid, "Heat 2")).await.unwrap();

    let tasks: Vec<_> = (0..6)
        .map(|_| {
            let videos = state.videos.clone();
            let id = v.id.clone();
            tokio::spawn(async move { videos.toggle_like(&id, "fan").await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    // An even number of toggles lands back where it started
    let stored = state.videos.get_video(&v.id, None).await.unwrap();
    assert_eq!(stored.likes_count, 0);
    assert!(!state.videos.is_liked(&v.id, "fan").await.unwrap());
}

#[tokio::test]
async fn pagination_covers_every_video_once() {
    let (state, _tmp) = test_state();
    let pid = profile_id(&state, "owner").await;
    let mut created = HashSet::new();
    for i in 0..5 {
        let v = state
            .videos
            .create_video("owner", video(&pid, &format!("Heat {i}")))
            .await
            .unwrap();
        created.insert(v.id);
    }

    let mut sizes = Vec::new();
    let mut seen = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = state
            .videos
            .list_videos_for_profile(&pid, None, Some(2), cursor.as_deref())
            .await
            .unwrap();
        sizes.push(page.items.len());
        seen.extend(page.items.into_iter().map(|v| v.id));
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    assert_eq!(sizes, vec![2, 2, 1]);
    assert_eq!(seen.len(), 5);
    assert_eq!(seen.iter().cloned().collect::<HashSet<_>>(), created);

    // Restartable from the beginning
    let restart = state
        .videos
        .list_videos_for_profile(&pid, None, Some(2), None)
        .await
        .unwrap();
    assert_eq!(restart.items[0].id, seen[0]);
}

#[tokio::test]
async fn comments_wait_for_approval() {
    let (state, _tmp) = test_state();
    let pid = profile_id(&state, "owner").await;
    let v = state.videos.create_video("owner", video(&pid, "Feature")).await.unwrap();

    let comment = state
        .videos
        .add_comment(&v.id, "fan", Some("Fan"), "what a save")
        .await
        .unwrap();
    assert!(!comment.approved);
    assert!(state.videos.list_comments(&v.id, None, None).await.unwrap().is_empty());

    state.videos.approve_comment(&comment.id, "owner").await.unwrap();
    let visible = state.videos.list_comments(&v.id, None, None).await.unwrap();
    assert_eq!(visible.len(), 1);
    assert!(visible[0].approved);

    assert!(matches!(
        state.videos.add_comment(&v.id, "fan", None, " \t").await,
        Err(AppError::EmptyBody)
    ));
}

#[tokio::test]
async fn approval_policy_is_captured_at_creation() {
    let (state, _tmp) = test_state();
    let pid = profile_id(&state, "owner").await;
    let v = state.videos.create_video("owner", video(&pid, "Main")).await.unwrap();

    state
        .videos
        .add_comment(&v.id, "fan", None, "queued")
        .await
        .unwrap();

    state
        .profiles
        .update_profile(
            "owner",
            ProfilePatch {
                comments_require_approval: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    state
        .videos
        .add_comment(&v.id, "fan", None, "instant")
        .await
        .unwrap();

    let visible = state.videos.list_comments(&v.id, None, None).await.unwrap();
    let bodies: Vec<&str> = visible.iter().map(|c| c.body.as_str()).collect();
    assert_eq!(bodies, vec!["instant"]);
}

#[tokio::test]
async fn deleting_video_requires_owner_and_cascades() {
    let (state, _tmp) = test_state();
    let pid = profile_id(&state, "owner").await;
    let v = state.videos.create_video("owner", video(&pid, "Crash")).await.unwrap();
    state.videos.toggle_like(&v.id, "fan").await.unwrap();
    let c = state.videos.add_comment(&v.id, "fan", None, "ouch").await.unwrap();

    assert!(matches!(
        state.videos.delete_video(&v.id, "fan").await,
        Err(AppError::Forbidden)
    ));
    state.videos.delete_video(&v.id, "owner").await.unwrap();

    assert!(matches!(
        state.videos.get_video(&v.id, Some("owner")).await,
        Err(AppError::NotFound)
    ));
    assert!(matches!(
        state.videos.like_comment(&c.id, "fan").await,
        Err(AppError::NotFound)
    ));
}

#[tokio::test]
async fn founder_follows_new_members() {
    let mut config = paddock::config::Config::default();
    config.community.founder_member_id = Some("founder".into());
    let (state, _tmp) = test_state_with(config);

    state.profiles.ensure_profile("founder").await.unwrap();
    state.profiles.ensure_profile("rookie").await.unwrap();

    assert!(state.social.is_following("rookie", "founder").await.unwrap());
    assert!(state.social.is_following("founder", "rookie").await.unwrap());
    assert!(state.social.is_mutual("rookie", "founder").await.unwrap());
}

#[tokio::test]
async fn display_names_are_unique_ignoring_case() {
    let (state, _tmp) = test_state();
    state
        .profiles
        .update_profile(
            "u1",
            ProfilePatch {
                display_name: Some("Dale Jr".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(!state
        .profiles
        .is_display_name_available("dale jr", None)
        .await
        .unwrap());
    assert!(state
        .profiles
        .is_display_name_available("DALE JR", Some("u1"))
        .await
        .unwrap());
    assert!(matches!(
        state
            .profiles
            .update_profile(
                "u2",
                ProfilePatch {
                    display_name: Some("DALE JR".into()),
                    ..Default::default()
                },
            )
            .await,
        Err(AppError::DisplayNameTaken)
    ));
}
