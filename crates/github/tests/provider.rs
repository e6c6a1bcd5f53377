use github::{GithubClient, GithubSettings};
use membership::{
    ConfigurationError, InvitationTarget, Login, MembershipProvider, OrganizationName,
    ProviderErrorKind, TeamSlug,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> GithubClient {
    GithubClient::new(&GithubSettings::new("test-token").with_api_url(server.uri())).unwrap()
}

fn org() -> OrganizationName {
    OrganizationName::new("acme").unwrap()
}

fn team() -> TeamSlug {
    TeamSlug::new("contributors").unwrap()
}

fn login(name: &str) -> Login {
    Login::new(name).unwrap()
}

async fn mount_team(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/orgs/acme/teams/contributors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 77, "slug": "contributors" })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn verify_target_accepts_existing_org_and_team() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-oauth-scopes", "repo, admin:org")
                .set_body_json(json!({ "login": "acme" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_team(&server).await;

    let target = InvitationTarget::new(org()).with_team(team());
    client(&server).verify_target(&target).await.unwrap();
}

#[tokio::test]
async fn verify_target_rejects_unknown_org() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
        .mount(&server)
        .await;

    let error = client(&server)
        .verify_target(&InvitationTarget::new(org()))
        .await
        .unwrap_err();
    assert!(matches!(error, ConfigurationError::UnknownOrganization { .. }));
}

#[tokio::test]
async fn verify_target_rejects_unknown_team() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "login": "acme" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme/teams/contributors"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let target = InvitationTarget::new(org()).with_team(team());
    let error = client(&server).verify_target(&target).await.unwrap_err();
    assert!(matches!(error, ConfigurationError::UnknownTeam { .. }));
}

#[tokio::test]
async fn verify_target_requires_admin_org_scope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-oauth-scopes", "repo, read:org")
                .set_body_json(json!({ "login": "acme" })),
        )
        .mount(&server)
        .await;

    let error = client(&server)
        .verify_target(&InvitationTarget::new(org()))
        .await
        .unwrap_err();
    assert_eq!(
        error,
        ConfigurationError::MissingScope {
            scope: "admin:org".into()
        }
    );
}

#[tokio::test]
async fn verify_target_reports_bad_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Bad credentials" })))
        .mount(&server)
        .await;

    let error = client(&server)
        .verify_target(&InvitationTarget::new(org()))
        .await
        .unwrap_err();
    assert_eq!(
        error,
        ConfigurationError::InvalidCredential {
            message: "Bad credentials".into()
        }
    );
}

#[tokio::test]
async fn org_membership_follows_status_codes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme/members/alice"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme/members/carol"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme/members/zed"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", "/orgs/acme/public_members/zed"),
        )
        .mount(&server)
        .await;

    let client = client(&server);
    assert!(client.is_org_member(&org(), &login("alice")).await.unwrap());
    assert!(!client.is_org_member(&org(), &login("carol")).await.unwrap());
    let error = client.is_org_member(&org(), &login("zed")).await.unwrap_err();
    assert_eq!(error.kind, ProviderErrorKind::PermissionDenied);
}

#[tokio::test]
async fn pending_team_membership_is_not_membership() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme/teams/contributors/memberships/alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "state": "active", "role": "member" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme/teams/contributors/memberships/frank"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "state": "pending", "role": "member" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme/teams/contributors/memberships/gina"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client(&server);
    assert!(client.is_team_member(&org(), &team(), &login("alice")).await.unwrap());
    assert!(!client.is_team_member(&org(), &team(), &login("frank")).await.unwrap());
    assert!(!client.is_team_member(&org(), &team(), &login("gina")).await.unwrap());
}

#[tokio::test]
async fn invite_sends_user_id_role_and_team() {
    let server = MockServer::start().await;
    mount_team(&server).await;
    Mock::given(method("GET"))
        .and(path("/users/carol"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "login": "carol", "id": 4242 })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/orgs/acme/invitations"))
        .and(body_json(json!({ "invitee_id": 4242, "role": "direct_member", "team_ids": [77] })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 1 })))
        .expect(1)
        .mount(&server)
        .await;

    let target = InvitationTarget::new(org()).with_team(team());
    client(&server)
        .invite_to_org(&target, &login("carol"))
        .await
        .unwrap();
}

#[tokio::test]
async fn invite_of_already_invited_user_is_already_pending() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/hana"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "login": "hana", "id": 5 })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/orgs/acme/invitations"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "Validation Failed",
            "errors": [{ "message": "Invitee is already a part of this organization" }]
        })))
        .mount(&server)
        .await;

    let error = client(&server)
        .invite_to_org(&InvitationTarget::new(org()), &login("hana"))
        .await
        .unwrap_err();
    assert_eq!(error.kind, ProviderErrorKind::AlreadyPending);
}

#[tokio::test]
async fn invite_of_unknown_user_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
        .mount(&server)
        .await;

    let error = client(&server)
        .invite_to_org(&InvitationTarget::new(org()), &login("ghost"))
        .await
        .unwrap_err();
    assert_eq!(error.kind, ProviderErrorKind::NotFound);
    assert!(error.message.contains("ghost"));
}

#[tokio::test]
async fn rate_limited_invite_carries_retry_hint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/dave"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "login": "dave", "id": 9 })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/orgs/acme/invitations"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("retry-after", "5")
                .set_body_json(json!({ "message": "You have exceeded a secondary rate limit" })),
        )
        .mount(&server)
        .await;

    let error = client(&server)
        .invite_to_org(&InvitationTarget::new(org()), &login("dave"))
        .await
        .unwrap_err();
    assert_eq!(error.kind, ProviderErrorKind::RateLimited);
    assert_eq!(error.retry_after, Some(std::time::Duration::from_secs(5)));
}

#[tokio::test]
async fn add_to_team_puts_member_role() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/orgs/acme/teams/contributors/memberships/frank"))
        .and(body_json(json!({ "role": "member" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "state": "active" })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .add_to_team(&org(), &team(), &login("frank"))
        .await
        .unwrap();
}

#[tokio::test]
async fn server_errors_are_transient() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/orgs/acme/teams/contributors/memberships/frank"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let error = client(&server)
        .add_to_team(&org(), &team(), &login("frank"))
        .await
        .unwrap_err();
    assert_eq!(error.kind, ProviderErrorKind::Transient);
}
