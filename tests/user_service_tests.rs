use darkroom::{
    models::{CreateImageRequest, CreateProjectRequest},
    repositories::Repositories,
    seed,
    services::{
        user_service::{SignupRequest, UserService, UserServiceError},
        ImageService, ProjectService,
    },
    test_utils::test_helpers,
};
use tempfile::TempDir;

struct Services {
    users: UserService,
    projects: ProjectService,
    images: ImageService,
    repos: Repositories,
}

async fn services() -> Services {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repos = Repositories::sqlite(pool);
    Services {
        users: UserService::new(
            repos.users.clone(),
            repos.projects.clone(),
            repos.images.clone(),
        ),
        projects: ProjectService::new(
            repos.projects.clone(),
            repos.images.clone(),
            repos.users.clone(),
        ),
        images: ImageService::new(repos.images.clone(), repos.projects.clone()),
        repos,
    }
}

#[tokio::test]
async fn test_signup_success() {
    let s = services().await;

    let user = s
        .users
        .signup(SignupRequest {
            email: Some("test@example.com".to_string()),
            password: Some("password123".to_string()),
            name: Some("Tester".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(user.email, "test@example.com");
    assert_eq!(user.name.as_deref(), Some("Tester"));
    let hash = user.password_hash.unwrap();
    assert!(hash.starts_with("$argon2"));
    assert_ne!(hash, "password123");
}

#[tokio::test]
async fn test_signup_duplicate_email() {
    let s = services().await;
    let request = || SignupRequest {
        email: Some("duplicate@example.com".to_string()),
        password: Some("password123".to_string()),
        name: None,
    };

    s.users.signup(request()).await.unwrap();
    assert!(matches!(
        s.users.signup(request()).await.unwrap_err(),
        UserServiceError::EmailTaken
    ));
}

#[tokio::test]
async fn test_get_or_create_defaults_name_to_local_part() {
    let s = services().await;

    let (user, created) = s
        .users
        .get_or_create(Some("jane.doe@example.com".to_string()), None)
        .await
        .unwrap();
    assert!(created);
    assert_eq!(user.name.as_deref(), Some("jane.doe"));

    let (again, created) = s
        .users
        .get_or_create(Some("jane.doe@example.com".to_string()), Some("Other".to_string()))
        .await
        .unwrap();
    assert!(!created);
    assert_eq!(again.id, user.id);
    assert_eq!(again.name.as_deref(), Some("jane.doe"));
}

#[tokio::test]
async fn test_update_name_can_clear() {
    let s = services().await;
    let (user, _) = s
        .users
        .get_or_create(Some("name@example.com".to_string()), Some("Named".to_string()))
        .await
        .unwrap();

    let unchanged = s.users.update_user(&user.id, None).await.unwrap();
    assert_eq!(unchanged.name.as_deref(), Some("Named"));

    let cleared = s.users.update_user(&user.id, Some(None)).await.unwrap();
    assert_eq!(cleared.name, None);

    assert!(matches!(
        s.users.update_user("missing", Some(None)).await,
        Err(UserServiceError::UserNotFound)
    ));
}

#[tokio::test]
async fn test_delete_user_removes_projects_and_images() {
    let s = services().await;
    let (user, _) = s
        .users
        .get_or_create(Some("owner@example.com".to_string()), None)
        .await
        .unwrap();

    let mut image_ids = Vec::new();
    for name in ["One", "Two"] {
        let project = s
            .projects
            .create_project(CreateProjectRequest {
                name: Some(name.to_string()),
                user_id: Some(user.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        let image = s
            .images
            .create_image(CreateImageRequest {
                url: Some(format!("/images/{}/1.png", name)),
                project_id: Some(project.id),
                variations: Vec::new(),
            })
            .await
            .unwrap();
        image_ids.push(image.id);
    }

    let detail = s.users.get_user_detail(&user.id).await.unwrap();
    assert_eq!(detail.projects.len(), 2);

    s.users.delete_user(&user.id).await.unwrap();

    assert!(s.projects.list_projects().await.unwrap().is_empty());
    for id in image_ids {
        assert!(s.images.get_image(&id).await.is_err());
    }
    assert!(s.users.find_user_by_id(&user.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_seed_demo_is_repeatable_with_reset() {
    let s = services().await;
    let images = TempDir::new().unwrap();
    for (dir, files) in [("Necklace", ["1.png", "2.jpg"]), ("Macaroons", ["a.jpeg", "b.png"])] {
        let path = images.path().join(dir);
        std::fs::create_dir_all(&path).unwrap();
        for file in files {
            std::fs::write(path.join(file), b"img").unwrap();
        }
    }

    let first = seed::seed_demo(&s.repos, images.path(), false).await.unwrap();
    assert_eq!(first.images, 2);

    let second = seed::seed_demo(&s.repos, images.path(), true).await.unwrap();
    assert_eq!(second.images, 2);
    assert_ne!(first.project_id, second.project_id);

    let projects = s.projects.list_projects().await.unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].project.name, seed::DEMO_PROJECT_NAME);
    assert_eq!(projects[0].images.len(), 2);
}
