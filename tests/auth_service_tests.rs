use darkroom::{
    repositories::Repositories,
    services::{
        auth_service::{AuthService, AuthServiceError, LoginRequest},
        user_service::{SignupRequest, UserService},
    },
    test_utils::test_helpers,
};

async fn services() -> (UserService, AuthService) {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repos = Repositories::sqlite(pool);
    let user_service = UserService::new(
        repos.users.clone(),
        repos.projects.clone(),
        repos.images.clone(),
    );
    let auth_service = AuthService::new(repos.users);
    (user_service, auth_service)
}

fn login(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: Some(email.to_string()),
        password: Some(password.to_string()),
    }
}

#[tokio::test]
async fn test_authenticate_success() {
    let (user_service, auth_service) = services().await;

    let created_user = user_service
        .signup(SignupRequest {
            email: Some("auth@example.com".to_string()),
            password: Some("correctpassword".to_string()),
            name: None,
        })
        .await
        .unwrap();

    let authenticated_user = auth_service
        .authenticate(login("auth@example.com", "correctpassword"))
        .await
        .unwrap();
    assert_eq!(authenticated_user.id, created_user.id);
    assert_eq!(authenticated_user.email, "auth@example.com");
}

#[tokio::test]
async fn test_authenticate_wrong_password() {
    let (user_service, auth_service) = services().await;

    user_service
        .signup(SignupRequest {
            email: Some("wrongpass@example.com".to_string()),
            password: Some("correctpassword".to_string()),
            name: None,
        })
        .await
        .unwrap();

    let result = auth_service
        .authenticate(login("wrongpass@example.com", "wrongpassword"))
        .await;
    assert!(matches!(
        result.unwrap_err(),
        AuthServiceError::InvalidCredentials
    ));
}

#[tokio::test]
async fn test_authenticate_nonexistent_user() {
    let (_, auth_service) = services().await;

    let result = auth_service
        .authenticate(login("nobody@example.com", "password"))
        .await;
    assert!(matches!(
        result.unwrap_err(),
        AuthServiceError::InvalidCredentials
    ));
}

#[tokio::test]
async fn test_passwordless_user_cannot_log_in() {
    let (user_service, auth_service) = services().await;

    // Users created through POST /users or one-time codes have no password
    user_service
        .get_or_create(Some("codes@example.com".to_string()), None)
        .await
        .unwrap();

    let result = auth_service
        .authenticate(login("codes@example.com", ""))
        .await;
    assert!(matches!(
        result.unwrap_err(),
        AuthServiceError::MissingCredentials
    ));

    let result = auth_service
        .authenticate(login("codes@example.com", "anything"))
        .await;
    assert!(matches!(
        result.unwrap_err(),
        AuthServiceError::InvalidCredentials
    ));
}

#[tokio::test]
async fn test_get_user_by_id() {
    let (user_service, auth_service) = services().await;
    let (user, _) = user_service
        .get_or_create(Some("lookup@example.com".to_string()), None)
        .await
        .unwrap();

    assert_eq!(
        auth_service.get_user_by_id(&user.id).await.unwrap().email,
        "lookup@example.com"
    );
    assert!(matches!(
        auth_service.get_user_by_id("missing").await,
        Err(AuthServiceError::UserNotFound)
    ));
}
