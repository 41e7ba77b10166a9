//! Tests for group and membership HTTP handlers.

use std::sync::Arc;

use super::*;
use crate::domain::demo_roster::{
    DEMO_CONVENOR, DEMO_OTHER_TUTORIAL_ID, DEMO_STUDENTS, DEMO_TUTOR, DEMO_TUTORIAL_ID,
    DEMO_UNIT_ID, demo_project_id,
};
use crate::domain::ports::{
    MockGroupCommand, MockGroupQuery, MockGroupSetCommand, MockGroupSetQuery, MockLoginService,
};
use crate::domain::UserId;
use crate::inbound::http::state::HttpStatePorts;
use crate::inbound::http::test_utils::{login_cookie, seeded_state, test_app};
use actix_http::Request;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use rstest::rstest;
use serde_json::{Value, json};

fn group_sets_uri() -> String {
    format!("/api/v1/units/{DEMO_UNIT_ID}/group_sets")
}

async fn create_group_set<S, B>(app: &S, cookie: &Cookie<'static>, body: Value) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: actix_web::body::MessageBody,
{
    let request = actix_test::TestRequest::post()
        .uri(&group_sets_uri())
        .cookie(cookie.clone())
        .set_json(json!({ "group_set": body }))
        .to_request();
    let created: Value = actix_test::call_and_read_body_json(app, request).await;
    created["id"].as_str().expect("group set id").to_owned()
}

async fn post_group<S, B, E>(
    app: &S,
    cookie: &Cookie<'static>,
    group_set_id: &str,
    group: Value,
) -> ServiceResponse<B>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = E>,
    E: std::fmt::Debug,
{
    let request = actix_test::TestRequest::post()
        .uri(&format!("{}/{group_set_id}/groups", group_sets_uri()))
        .cookie(cookie.clone())
        .set_json(json!({ "group": group }))
        .to_request();
    actix_test::call_service(app, request).await
}

fn mock_state(groups: MockGroupCommand, groups_query: MockGroupQuery) -> HttpState {
    HttpState::new(HttpStatePorts {
        login: Arc::new(MockLoginService::new()),
        group_sets: Arc::new(MockGroupSetCommand::new()),
        group_sets_query: Arc::new(MockGroupSetQuery::new()),
        groups: Arc::new(groups),
        groups_query: Arc::new(groups_query),
    })
}

#[rstest]
fn patch_keeps_absent_fields_absent() {
    let update = GroupUpdate::from(GroupPatch {
        locked: Some(true),
        ..GroupPatch::default()
    });
    assert_eq!(
        update,
        GroupUpdate {
            locked: Some(true),
            ..GroupUpdate::default()
        }
    );
}

#[rstest]
fn new_group_payload_keeps_tutorial_id_unparsed() {
    let input = GroupInput::from(NewGroupPayload {
        name: Some("Alpha".to_owned()),
        tutorial_id: Some("tutorial-1".to_owned()),
        capacity_adjustment: None,
    });
    assert_eq!(input.tutorial_id.as_deref(), Some("tutorial-1"));
}

#[rstest]
fn member_body_requires_project_id() {
    let err = parse_member_body(AddMemberBody::default()).expect_err("missing project id");
    assert_eq!(err.message(), "missing required field: project_id");
}

#[actix_web::test]
async fn update_forwards_only_the_lock_change() {
    let mut groups = MockGroupCommand::new();
    groups
        .expect_update_group()
        .withf(|request| {
            request.changes
                == GroupUpdate {
                    locked: Some(false),
                    ..GroupUpdate::default()
                }
        })
        .times(1)
        .returning(|_| Err(Error::forbidden("only staff may lock or unlock groups")));
    let app = actix_test::init_service(
        actix_web::App::new()
            .app_data(web::Data::new(mock_state(groups, MockGroupQuery::new())))
            .wrap(crate::inbound::http::test_utils::test_session_middleware())
            .service(
                web::scope("/api/v1")
                    .service(update_group)
                    .route(
                        "/test/session",
                        web::post().to(|session: SessionContext| async move {
                            session.persist_user(&UserId::random())?;
                            Ok::<_, Error>(HttpResponse::Ok().finish())
                        }),
                    ),
            ),
    )
    .await;
    let login = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/test/session")
            .to_request(),
    )
    .await;
    let cookie = login
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
        .expect("session cookie");

    let uri = format!(
        "/api/v1/units/{DEMO_UNIT_ID}/group_sets/{}/groups/{}",
        uuid::Uuid::new_v4(),
        uuid::Uuid::new_v4()
    );
    let request = actix_test::TestRequest::put()
        .uri(&uri)
        .cookie(cookie)
        .set_json(json!({ "group": { "locked": false } }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn convenor_creates_unlocked_groups_with_sequential_numbers() {
    let app = actix_test::init_service(test_app(seeded_state().await)).await;
    let convenor = login_cookie(&app, DEMO_CONVENOR).await;
    let set_id = create_group_set(&app, &convenor, json!({ "name": "Teams" })).await;

    for (name, number) in [("Alpha", 1), ("Beta", 2)] {
        let response = post_group(
            &app,
            &convenor,
            &set_id,
            json!({ "name": name, "tutorial_id": DEMO_TUTORIAL_ID }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["locked"], false);
        assert_eq!(body["number"], number);
        assert_eq!(body["member_count"], 0);
        assert_eq!(body["capacity_adjustment"], 0);
        assert_eq!(body["group_set_id"], set_id.as_str());
    }
}

#[actix_web::test]
async fn unknown_tutorial_is_a_bad_request() {
    let app = actix_test::init_service(test_app(seeded_state().await)).await;
    let convenor = login_cookie(&app, DEMO_CONVENOR).await;
    let set_id = create_group_set(&app, &convenor, json!({ "name": "Teams" })).await;

    let response = post_group(
        &app,
        &convenor,
        &set_id,
        json!({ "name": "Alpha", "tutorial_id": uuid::Uuid::new_v4() }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn student_creates_group_as_its_first_member() {
    let app = actix_test::init_service(test_app(seeded_state().await)).await;
    let convenor = login_cookie(&app, DEMO_CONVENOR).await;
    let set_id = create_group_set(
        &app,
        &convenor,
        json!({ "name": "Self enrol", "allow_students_to_create_groups": true }),
    )
    .await;
    let student = login_cookie(&app, DEMO_STUDENTS[0]).await;

    let response = post_group(&app, &student, &set_id, json!({ "name": "Owls" })).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["member_count"], 1);
    assert_eq!(body["tutorial_id"], DEMO_TUTORIAL_ID.to_string());

    let members = actix_test::TestRequest::get()
        .uri(&format!(
            "{}/{set_id}/groups/{}/members",
            group_sets_uri(),
            body["id"].as_str().expect("group id")
        ))
        .cookie(student.clone())
        .to_request();
    let members: Value = actix_test::call_and_read_body_json(&app, members).await;
    assert_eq!(members, json!([{ "project_id": demo_project_id(0) }]));

    let second = post_group(&app, &student, &set_id, json!({ "name": "Larks" })).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn students_cannot_create_groups_unless_allowed() {
    let app = actix_test::init_service(test_app(seeded_state().await)).await;
    let convenor = login_cookie(&app, DEMO_CONVENOR).await;
    let set_id = create_group_set(&app, &convenor, json!({ "name": "Staff run" })).await;
    let student = login_cookie(&app, DEMO_STUDENTS[0]).await;

    let response = post_group(&app, &student, &set_id, json!({ "name": "Owls" })).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn invalid_tutorial_id_is_reported_by_field() {
    let app = actix_test::init_service(test_app(seeded_state().await)).await;
    let convenor = login_cookie(&app, DEMO_CONVENOR).await;
    let set_id = create_group_set(&app, &convenor, json!({ "name": "Teams" })).await;

    let response = post_group(
        &app,
        &convenor,
        &set_id,
        json!({ "name": "Alpha", "tutorial_id": "tutorial-1" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["code"], json!("invalid_request"));
    assert_eq!(body["details"]["field"], json!("tutorial_id"));
    assert_eq!(body["details"]["code"], json!("invalid_uuid"));
}

#[actix_web::test]
async fn forbidden_creation_wins_over_a_malformed_tutorial_id() {
    let app = actix_test::init_service(test_app(seeded_state().await)).await;
    let convenor = login_cookie(&app, DEMO_CONVENOR).await;
    let set_id = create_group_set(&app, &convenor, json!({ "name": "Staff run" })).await;
    let student = login_cookie(&app, DEMO_STUDENTS[0]).await;

    let response = post_group(
        &app,
        &student,
        &set_id,
        json!({ "name": "Owls", "tutorial_id": "bogus" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[rstest]
#[case(json!({ "locked": true }))]
#[case(json!({ "capacity_adjustment": 2 }))]
#[case(json!({ "tutorial_id": "bogus" }))]
#[actix_web::test]
async fn staff_only_changes_are_forbidden_whether_or_not_the_group_exists(#[case] group: Value) {
    let app = actix_test::init_service(test_app(seeded_state().await)).await;
    let convenor = login_cookie(&app, DEMO_CONVENOR).await;
    let set_id = create_group_set(
        &app,
        &convenor,
        json!({ "name": "Self enrol", "allow_students_to_create_groups": true }),
    )
    .await;
    let student = login_cookie(&app, DEMO_STUDENTS[0]).await;
    let created = post_group(&app, &student, &set_id, json!({ "name": "Owls" })).await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let owls: Value = actix_test::read_body_json(created).await;
    let existing = owls["id"].as_str().expect("group id").to_owned();

    for group_id in [existing, uuid::Uuid::new_v4().to_string()] {
        let request = actix_test::TestRequest::put()
            .uri(&format!("{}/{set_id}/groups/{group_id}", group_sets_uri()))
            .cookie(student.clone())
            .set_json(json!({ "group": group.clone() }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "group {group_id}");
    }
}

#[actix_web::test]
async fn student_deletes_are_forbidden_whether_or_not_the_group_exists() {
    let app = actix_test::init_service(test_app(seeded_state().await)).await;
    let convenor = login_cookie(&app, DEMO_CONVENOR).await;
    let set_id = create_group_set(&app, &convenor, json!({ "name": "Teams" })).await;
    let created = post_group(
        &app,
        &convenor,
        &set_id,
        json!({ "name": "Alpha", "tutorial_id": DEMO_TUTORIAL_ID }),
    )
    .await;
    let alpha: Value = actix_test::read_body_json(created).await;
    let existing = alpha["id"].as_str().expect("group id").to_owned();
    let student = login_cookie(&app, DEMO_STUDENTS[0]).await;

    for group_id in [existing.clone(), uuid::Uuid::new_v4().to_string()] {
        let request = actix_test::TestRequest::delete()
            .uri(&format!("{}/{set_id}/groups/{group_id}", group_sets_uri()))
            .cookie(student.clone())
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "group {group_id}");
    }

    let fetch = actix_test::TestRequest::get()
        .uri(&format!("{}/{set_id}/groups/{existing}", group_sets_uri()))
        .cookie(convenor)
        .to_request();
    assert_eq!(
        actix_test::call_service(&app, fetch).await.status(),
        StatusCode::OK
    );
}

#[actix_web::test]
async fn unit_listing_returns_every_persisted_group() {
    let app = actix_test::init_service(test_app(seeded_state().await)).await;
    let convenor = login_cookie(&app, DEMO_CONVENOR).await;
    let teams = create_group_set(&app, &convenor, json!({ "name": "Teams" })).await;
    let labs = create_group_set(&app, &convenor, json!({ "name": "Labs" })).await;

    let mut expected = Vec::new();
    for (set_id, name) in [(&teams, "Alpha"), (&teams, "Beta"), (&labs, "Gamma")] {
        let created = post_group(
            &app,
            &convenor,
            set_id,
            json!({ "name": name, "tutorial_id": DEMO_TUTORIAL_ID }),
        )
        .await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let body: Value = actix_test::read_body_json(created).await;
        expected.push((
            body["id"].as_str().expect("group id").to_owned(),
            name.to_owned(),
        ));
    }

    let request = actix_test::TestRequest::get()
        .uri(&format!("/api/v1/units/{DEMO_UNIT_ID}/groups"))
        .cookie(convenor)
        .to_request();
    let listed: Value = actix_test::call_and_read_body_json(&app, request).await;
    let mut listed: Vec<(String, String)> = listed
        .as_array()
        .expect("group array")
        .iter()
        .map(|group| {
            (
                group["id"].as_str().expect("id").to_owned(),
                group["name"].as_str().expect("name").to_owned(),
            )
        })
        .collect();
    listed.sort();
    expected.sort();
    assert_eq!(listed, expected);
}

#[rstest]
#[case(DEMO_CONVENOR, StatusCode::OK)]
#[case(DEMO_TUTOR, StatusCode::OK)]
#[case(DEMO_STUDENTS[0], StatusCode::FORBIDDEN)]
#[actix_web::test]
async fn only_staff_list_unit_groups(#[case] username: &str, #[case] expected: StatusCode) {
    let app = actix_test::init_service(test_app(seeded_state().await)).await;
    let cookie = login_cookie(&app, username).await;
    let request = actix_test::TestRequest::get()
        .uri(&format!("/api/v1/units/{DEMO_UNIT_ID}/groups"))
        .cookie(cookie)
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), expected);
}

#[actix_web::test]
async fn keep_same_class_rejects_members_from_other_tutorials() {
    let app = actix_test::init_service(test_app(seeded_state().await)).await;
    let convenor = login_cookie(&app, DEMO_CONVENOR).await;
    let set_id = create_group_set(
        &app,
        &convenor,
        json!({ "name": "Class bound", "keep_groups_in_same_class": true }),
    )
    .await;
    let created = post_group(
        &app,
        &convenor,
        &set_id,
        json!({ "name": "Alpha", "tutorial_id": DEMO_OTHER_TUTORIAL_ID }),
    )
    .await;
    let group: Value = actix_test::read_body_json(created).await;
    let members_uri = format!(
        "{}/{set_id}/groups/{}/members",
        group_sets_uri(),
        group["id"].as_str().expect("group id")
    );

    let wrong_class = actix_test::TestRequest::post()
        .uri(&members_uri)
        .cookie(convenor.clone())
        .set_json(json!({ "project_id": demo_project_id(0) }))
        .to_request();
    assert_eq!(
        actix_test::call_service(&app, wrong_class).await.status(),
        StatusCode::BAD_REQUEST
    );

    let right_class = actix_test::TestRequest::post()
        .uri(&members_uri)
        .cookie(convenor)
        .set_json(json!({ "project_id": demo_project_id(2) }))
        .to_request();
    let response = actix_test::call_service(&app, right_class).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["member_count"], 1);
}

#[actix_web::test]
async fn tutor_removes_member_and_deletes_group() {
    let app = actix_test::init_service(test_app(seeded_state().await)).await;
    let convenor = login_cookie(&app, DEMO_CONVENOR).await;
    let set_id = create_group_set(&app, &convenor, json!({ "name": "Teams" })).await;
    let created = post_group(
        &app,
        &convenor,
        &set_id,
        json!({ "name": "Alpha", "tutorial_id": DEMO_TUTORIAL_ID }),
    )
    .await;
    let group: Value = actix_test::read_body_json(created).await;
    let group_uri = format!(
        "{}/{set_id}/groups/{}",
        group_sets_uri(),
        group["id"].as_str().expect("group id")
    );
    let add = actix_test::TestRequest::post()
        .uri(&format!("{group_uri}/members"))
        .cookie(convenor)
        .set_json(json!({ "project_id": demo_project_id(1) }))
        .to_request();
    assert_eq!(
        actix_test::call_service(&app, add).await.status(),
        StatusCode::CREATED
    );

    let tutor = login_cookie(&app, DEMO_TUTOR).await;
    let remove = actix_test::TestRequest::delete()
        .uri(&format!("{group_uri}/members/{}", demo_project_id(1)))
        .cookie(tutor.clone())
        .to_request();
    assert_eq!(
        actix_test::call_service(&app, remove).await.status(),
        StatusCode::NO_CONTENT
    );

    let delete = actix_test::TestRequest::delete()
        .uri(&group_uri)
        .cookie(tutor.clone())
        .to_request();
    assert_eq!(
        actix_test::call_service(&app, delete).await.status(),
        StatusCode::NO_CONTENT
    );

    let fetch = actix_test::TestRequest::get()
        .uri(&group_uri)
        .cookie(tutor)
        .to_request();
    assert_eq!(
        actix_test::call_service(&app, fetch).await.status(),
        StatusCode::NOT_FOUND
    );
}
