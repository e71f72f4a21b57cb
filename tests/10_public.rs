mod common;

use anyhow::Result;
use axum::http::StatusCode;
use uuid::Uuid;

use common::{cookies, TestApp};
use sweet_pea::database::TestimonialStore;
use sweet_pea::types::ListOrder;

#[tokio::test]
async fn anonymous_list_shows_everything_without_actions() -> Result<()> {
    let app = TestApp::new();
    let rosa = app.user("rosa").await?;
    let lily = app.user("lily").await?;
    let first = app.testimonial(&rosa, "Best bouquet I ever ordered").await?;
    let second = app.testimonial(&lily, "Delivered right on time").await?;

    let res = app.get("/", None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains("Best bouquet I ever ordered"));
    assert!(res.body.contains("Delivered right on time"));

    // Creation order on the public site
    let a = res.body.find("Best bouquet").unwrap();
    let b = res.body.find("Delivered right").unwrap();
    assert!(a < b);

    assert!(!res.body.contains(r#"href="/new/""#));
    assert!(!res.body.contains("Share your experience"));
    assert!(!res.body.contains(">Edit</a>"));
    assert!(!res.body.contains(">Delete</a>"));

    // The same page for the author does carry the links
    let mine = app.get("/", Some(&app.session_for(&rosa)?)).await?;
    assert!(mine.body.contains(r#"href="/new/""#));
    assert!(mine.body.contains(&format!(r#"href="/{}/edit/""#, first.id)));
    assert!(mine.body.contains(&format!(r#"href="/{}/delete/""#, first.id)));
    assert!(!mine.body.contains(&format!(r#"href="/{}/delete/""#, second.id)));
    Ok(())
}

#[tokio::test]
async fn owner_sees_actions_only_on_own_rows() -> Result<()> {
    let app = TestApp::new();
    let rosa = app.user("rosa").await?;
    let lily = app.user("lily").await?;
    let mine = app.testimonial(&rosa, "Mine").await?;
    let theirs = app.testimonial(&lily, "Theirs").await?;

    let res = app.get("/", Some(&app.session_for(&rosa)?)).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains(r#"<a href="/new/">Share your experience</a>"#));
    assert!(res.body.contains(&format!(r#"<a href="/{}/edit/">Edit</a>"#, mine.id)));
    assert!(!res.body.contains(&format!(r#"href="/{}/edit/""#, theirs.id)));
    assert_eq!(res.body.matches(">Edit</a>").count(), 1);
    Ok(())
}

#[tokio::test]
async fn create_requires_login() -> Result<()> {
    let app = TestApp::new();

    assert_eq!(app.get("/new/", None).await?.status, StatusCode::FORBIDDEN);

    let res = app.post("/new/", &[("body", "Sneaky")], None).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(app.store.count().await?, 0);
    Ok(())
}

#[tokio::test]
async fn unreadable_body_is_checked_after_permission() -> Result<()> {
    let app = TestApp::new();
    let rosa = app.user("rosa").await?;
    let record = app.testimonial(&rosa, "Rosa's words").await?;
    let json = r#"{"body": "Sneaky"}"#;

    let anonymous = app.post_raw("/new/", "application/json", json, None).await?;
    assert_eq!(anonymous.status, StatusCode::FORBIDDEN);
    assert!(anonymous.content_type().unwrap_or_default().starts_with("text/html"));

    let lily = app.user("lily").await?;
    let edit = format!("/{}/edit/", record.id);
    let other = app
        .post_raw(&edit, "application/json", json, Some(&app.session_for(&lily)?))
        .await?;
    assert_eq!(other.status, StatusCode::FORBIDDEN);

    let session = app.session_for(&rosa)?;
    let signed_in = app.post_raw("/new/", "application/json", json, Some(&session)).await?;
    assert_eq!(signed_in.status, StatusCode::BAD_REQUEST);
    assert!(signed_in.content_type().unwrap_or_default().starts_with("text/html"));

    let owner = app.post_raw(&edit, "application/json", json, Some(&session)).await?;
    assert_eq!(owner.status, StatusCode::BAD_REQUEST);

    assert_eq!(app.store.count().await?, 1);
    assert_eq!(app.store.get(record.id).await?.unwrap().body, "Rosa's words");
    Ok(())
}

#[tokio::test]
async fn create_records_requester_as_author() -> Result<()> {
    let app = TestApp::new();
    let rosa = app.user("rosa").await?;
    let lily = app.user("lily").await?;
    let session = app.session_for(&rosa)?;

    let res = app
        .post(
            "/new/",
            &[
                ("body", "Loved the service!"),
                ("location", "Portland"),
                ("author", &lily.id.to_string()),
                ("author_id", &lily.id.to_string()),
            ],
            Some(&session),
        )
        .await?;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location(), Some("/"));

    let all = app.store.all(ListOrder::Created).await?;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].author_id, rosa.id);
    assert_eq!(all[0].body, "Loved the service!");
    assert_eq!(all[0].location.as_deref(), Some("Portland"));
    Ok(())
}

#[tokio::test]
async fn invalid_form_is_rerendered_without_writing() -> Result<()> {
    let app = TestApp::new();
    let rosa = app.user("rosa").await?;
    let session = app.session_for(&rosa)?;

    let res = app.post("/new/", &[("body", "   "), ("location", "Here")], Some(&session)).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains("This field is required."));
    assert!(res.body.contains("Here"));

    let long = "x".repeat(101);
    let res = app.post("/new/", &[("body", "Fine"), ("location", &long)], Some(&session)).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains("at most 100 characters"));

    assert_eq!(app.store.count().await?, 0);
    Ok(())
}

#[tokio::test]
async fn owner_can_update_and_timestamps_stay_ordered() -> Result<()> {
    let app = TestApp::new();
    let rosa = app.user("rosa").await?;
    let record = app.testimonial(&rosa, "Original").await?;
    let session = app.session_for(&rosa)?;

    let form = app.get(&format!("/{}/edit/", record.id), Some(&session)).await?;
    assert_eq!(form.status, StatusCode::OK);
    assert!(form.body.contains("Original"));

    let res = app
        .post(&format!("/{}/edit/", record.id), &[("body", "Revised"), ("location", "")], Some(&session))
        .await?;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location(), Some("/"));

    let stored = app.store.get(record.id).await?.unwrap();
    assert_eq!(stored.body, "Revised");
    assert_eq!(stored.location, None);
    assert_eq!(stored.author_id, rosa.id);
    assert_eq!(stored.created_at, record.created_at);
    assert!(stored.created_at <= stored.updated_at);
    Ok(())
}

#[tokio::test]
async fn non_owner_is_forbidden_and_record_unchanged() -> Result<()> {
    let app = TestApp::new();
    let rosa = app.user("rosa").await?;
    let lily = app.user("lily").await?;
    let record = app.testimonial(&rosa, "Rosa's words").await?;
    let session = app.session_for(&lily)?;

    let edit = format!("/{}/edit/", record.id);
    let delete = format!("/{}/delete/", record.id);

    assert_eq!(app.get(&edit, Some(&session)).await?.status, StatusCode::FORBIDDEN);
    assert_eq!(app.get(&delete, Some(&session)).await?.status, StatusCode::FORBIDDEN);
    assert_eq!(
        app.post(&edit, &[("body", "Hijacked")], Some(&session)).await?.status,
        StatusCode::FORBIDDEN
    );
    assert_eq!(app.post(&delete, &[], Some(&session)).await?.status, StatusCode::FORBIDDEN);

    let stored = app.store.get(record.id).await?.unwrap();
    assert_eq!(stored.body, "Rosa's words");
    assert_eq!(stored.updated_at, record.updated_at);
    Ok(())
}

#[tokio::test]
async fn staff_get_no_special_rights_on_public_site() -> Result<()> {
    let app = TestApp::new();
    let rosa = app.user("rosa").await?;
    let admin = app.staff("admin").await?;
    let record = app.testimonial(&rosa, "Rosa's words").await?;

    let res = app
        .post(&format!("/{}/delete/", record.id), &[], Some(&app.session_for(&admin)?))
        .await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert!(app.store.get(record.id).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn owner_can_delete_after_confirmation() -> Result<()> {
    let app = TestApp::new();
    let rosa = app.user("rosa").await?;
    let record = app.testimonial(&rosa, "Short lived").await?;
    let session = app.session_for(&rosa)?;
    let delete = format!("/{}/delete/", record.id);

    let confirm = app.get(&delete, Some(&session)).await?;
    assert_eq!(confirm.status, StatusCode::OK);
    assert!(confirm.body.contains("Short lived"));
    assert!(app.store.get(record.id).await?.is_some());

    let res = app.post(&delete, &[], Some(&session)).await?;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location(), Some("/"));
    assert!(app.store.get(record.id).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn unknown_and_malformed_ids_are_not_found() -> Result<()> {
    let app = TestApp::new();
    let rosa = app.user("rosa").await?;
    let session = app.session_for(&rosa)?;

    let missing = app.get(&format!("/{}/edit/", Uuid::new_v4()), Some(&session)).await?;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let malformed = app.get("/not-a-uuid/delete/", Some(&session)).await?;
    assert_eq!(malformed.status, StatusCode::NOT_FOUND);

    let unrouted = app.get("/no/such/page/", None).await?;
    assert_eq!(unrouted.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn notice_shows_once_then_clears() -> Result<()> {
    let app = TestApp::new();
    let rosa = app.user("rosa").await?;
    let session = app.session_for(&rosa)?;

    let res = app.post("/new/", &[("body", "Lovely peonies")], Some(&session)).await?;
    let flash = res.flash().expect("notice cookie");

    let next = app.get("/", Some(&cookies(&[&session, &flash]))).await?;
    assert!(next.body.contains("Thank you! Your testimonial has been published."));
    assert!(next.clears_cookie("sweetpea_messages"));

    let after = app.get("/", Some(&session)).await?;
    assert!(!after.body.contains("Thank you!"));
    Ok(())
}

#[tokio::test]
async fn notice_cookie_is_secure_when_sessions_are() -> Result<()> {
    let app = TestApp::with_secure_cookies(true);
    let rosa = app.user("rosa").await?;

    let res = app.post("/new/", &[("body", "Lovely peonies")], Some(&app.session_for(&rosa)?)).await?;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    let line = res.set_cookie_line("sweetpea_messages").expect("notice cookie");
    assert!(line.contains("Secure"));

    let plain = TestApp::new();
    let lily = plain.user("lily").await?;
    let res = plain.post("/new/", &[("body", "Sweet")], Some(&plain.session_for(&lily)?)).await?;
    let line = res.set_cookie_line("sweetpea_messages").expect("notice cookie");
    assert!(!line.contains("Secure"));
    Ok(())
}

#[tokio::test]
async fn tampered_session_is_anonymous() -> Result<()> {
    let app = TestApp::new();
    let rosa = app.user("rosa").await?;
    let session = format!("{}x", app.session_for(&rosa)?);

    let res = app.get("/new/", Some(&session)).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    Ok(())
}
