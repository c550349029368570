//! Demo data loader used by `cli seed`.
//!
//! Every subdirectory of the images directory is one concept: its first image
//! file (by name) becomes the Image URL and the rest become its variations.

use anyhow::{bail, Context};
use std::path::Path;

use crate::models::{NewImage, NewProject, NewUser};
use crate::repositories::Repositories;
use crate::services::UserService;

pub const DEMO_USER_EMAIL: &str = "test@example.com";
pub const DEMO_USER_NAME: &str = "Test User";
pub const DEMO_PROJECT_NAME: &str = "Demo Project";
const DEMO_PROJECT_DESCRIPTION: &str = "A demonstration project with sample images";

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpeg", "jpg"];

#[derive(Debug, Clone, PartialEq)]
pub struct ConceptFiles {
    pub name: String,
    pub main: String,
    pub variations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeedSummary {
    pub user_id: String,
    pub project_id: String,
    pub images: usize,
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Lists concept directories under `images_dir`, sorted by name. Directories
/// without image files are skipped.
pub fn scan_concepts(images_dir: &Path) -> anyhow::Result<Vec<ConceptFiles>> {
    let entries = std::fs::read_dir(images_dir)
        .with_context(|| format!("reading {}", images_dir.display()))?;

    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    dirs.sort();

    let mut concepts = Vec::new();
    for dir in dirs {
        let mut files: Vec<String> = std::fs::read_dir(images_dir.join(&dir))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_image_file(path))
            .filter_map(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        files.sort();

        let mut urls = files
            .into_iter()
            .map(|file| format!("/images/{}/{}", dir, file));
        let Some(main) = urls.next() else {
            tracing::warn!("Skipping {}: no image files", dir);
            continue;
        };
        let variations: Vec<String> = urls.collect();
        concepts.push(ConceptFiles {
            name: dir,
            main,
            variations,
        });
    }

    Ok(concepts)
}

/// Loads the demo user, a demo project and one image per concept. With
/// `reset` every existing user (and so every project and image) is removed
/// first.
pub async fn seed_demo(
    repositories: &Repositories,
    images_dir: &Path,
    reset: bool,
) -> anyhow::Result<SeedSummary> {
    let concepts = scan_concepts(images_dir)?;
    if concepts.is_empty() {
        bail!("no concept directories with images under {}", images_dir.display());
    }

    let users = UserService::new(
        repositories.users.clone(),
        repositories.projects.clone(),
        repositories.images.clone(),
    );

    if reset {
        for user in users.list_users().await? {
            users.delete_user(&user.id).await?;
        }
        tracing::info!("Cleared existing users, projects and images");
    }

    let user = match repositories.users.find_by_email(DEMO_USER_EMAIL).await? {
        Some(user) => user,
        None => {
            repositories
                .users
                .create_user(NewUser {
                    email: DEMO_USER_EMAIL.to_string(),
                    name: Some(DEMO_USER_NAME.to_string()),
                    password_hash: None,
                })
                .await?
        }
    };

    let project = repositories
        .projects
        .create_project(NewProject {
            name: DEMO_PROJECT_NAME.to_string(),
            description: Some(DEMO_PROJECT_DESCRIPTION.to_string()),
            user_id: user.id.clone(),
        })
        .await?;

    for concept in &concepts {
        repositories
            .images
            .create_image(NewImage {
                url: concept.main.clone(),
                project_id: project.id.clone(),
                variations: concept.variations.clone(),
            })
            .await?;
        tracing::info!(
            "Created image for {} with {} variations",
            concept.name,
            concept.variations.len()
        );
    }

    Ok(SeedSummary {
        user_id: user.id,
        project_id: project.id,
        images: concepts.len(),
    })
}
