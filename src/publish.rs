//! Export followed by commit and push of the configured repositories.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::config::{AppConfig, RepoConfig};
use crate::data::Storage;
use crate::export::{export_all, ExportStyle};
use crate::git::{GitRepo, PublishOutcome};

/// Result of publishing one repository
#[derive(Debug)]
pub struct RepoReport {
    pub dir: PathBuf,
    pub outcome: PublishOutcome,
}

/// Default commit message for a given day
pub fn default_message(today: NaiveDate) -> String {
    format!("Update running log {today}")
}

/// Export images for `year`, then publish the images and data repositories.
/// Fails when neither repository is configured, and before anything is
/// written when one of them is not a git working tree. With `pull`, each
/// repository is pulled before exporting.
pub fn publish(
    config: &AppConfig,
    storage: &Storage,
    year: i32,
    message: &str,
    pull: bool,
) -> Result<Vec<RepoReport>> {
    let configured: Vec<&RepoConfig> = [&config.images_repo, &config.data_repo]
        .into_iter()
        .flatten()
        .collect();
    if configured.is_empty() {
        anyhow::bail!("No repository configured: set images_repo or data_repo in the config file");
    }
    let repos = configured
        .into_iter()
        .map(|r| -> Result<_> { Ok((r, GitRepo::open(&r.dir)?)) })
        .collect::<Result<Vec<_>>>()?;

    if pull {
        for (r, repo) in &repos {
            repo.pull()
                .with_context(|| format!("Failed to pull {:?}", r.dir))?;
        }
    }

    let style = ExportStyle::new(config.dark_mode, config.heatmap_levels);
    let written = export_all(storage, year, &config.images_dir(), &style)?;
    info!(files = written.len(), "exported before publishing");

    let mut reports = Vec::with_capacity(repos.len());
    for (r, repo) in repos {
        let outcome = repo
            .publish(message, r.remote.as_deref())
            .with_context(|| format!("Failed to publish {:?}", r.dir))?;
        if outcome == PublishOutcome::Committed {
            warn!(dir = ?r.dir, "committed but not pushed");
        }
        reports.push(RepoReport {
            dir: r.dir.clone(),
            outcome,
        });
    }
    Ok(reports)
}

/// One line per repository for display
pub fn describe(reports: &[RepoReport]) -> String {
    reports
        .iter()
        .map(|r| {
            let what = match r.outcome {
                PublishOutcome::NothingToDo => "up to date",
                PublishOutcome::Committed => "committed (push failed)",
                PublishOutcome::Pushed => "pushed",
            };
            format!("{}: {what}", r.dir.display())
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::NewRun;
    use crate::git::fixtures::{clone_with_remote, git, git_available};

    #[test]
    fn test_publish_requires_a_repository() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            data_dir: dir.path().to_path_buf(),
            ..AppConfig::default()
        };
        let storage = Storage::open(dir.path()).unwrap();
        let err = publish(&config, &storage, 2024, "msg", false).unwrap_err();
        assert!(err.to_string().contains("No repository configured"));
    }

    #[test]
    fn test_publish_rejects_non_repository() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            data_dir: dir.path().join("data"),
            images_repo: Some(RepoConfig {
                dir: dir.path().join("images"),
                remote: None,
            }),
            ..AppConfig::default()
        };
        let storage = Storage::open(&config.data_dir).unwrap();
        let err = publish(&config, &storage, 2024, "msg", false).unwrap_err();
        assert!(format!("{err:#}").contains("not a git repository"), "{err:#}");
        // Nothing is exported into a directory that cannot be published
        assert!(!dir.path().join("images").join("heatmap-2024.svg").exists());
    }

    #[test]
    fn test_publish_images_and_data_repos() {
        if !git_available() {
            return;
        }
        let root = tempfile::tempdir().unwrap();
        let images = clone_with_remote(root.path(), "images");
        let data = clone_with_remote(root.path(), "data");

        let config = AppConfig {
            data_dir: data.clone(),
            images_repo: Some(RepoConfig {
                dir: images.clone(),
                remote: Some("origin".to_string()),
            }),
            data_repo: Some(RepoConfig {
                dir: data.clone(),
                remote: None,
            }),
            ..AppConfig::default()
        };
        let storage = Storage::open(&data).unwrap();
        storage
            .save(&NewRun::new(NaiveDate::from_ymd_opt(2024, 5, 4).unwrap(), 10.0))
            .unwrap();

        let reports = publish(&config, &storage, 2024, "Update running log", true).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].outcome, PublishOutcome::Pushed);
        assert_eq!(reports[1].outcome, PublishOutcome::Pushed);

        let images_tracked = git(&images, &["ls-files"]);
        assert!(images_tracked.contains("heatmap-2024.svg"), "{images_tracked}");
        let data_tracked = git(&data, &["ls-files"]);
        assert!(data_tracked.contains("RunningLog.db"), "{data_tracked}");
        assert!(!data_tracked.contains("runlog.log"), "{data_tracked}");

        // Same data again: the exported images are unchanged
        let again = publish(&config, &storage, 2024, "Update running log", true).unwrap();
        assert_eq!(again[0].outcome, PublishOutcome::NothingToDo);
    }

    #[test]
    fn test_default_message_and_describe() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 4).unwrap();
        assert_eq!(default_message(day), "Update running log 2024-05-04");

        let reports = vec![
            RepoReport { dir: PathBuf::from("/a"), outcome: PublishOutcome::Pushed },
            RepoReport { dir: PathBuf::from("/b"), outcome: PublishOutcome::NothingToDo },
        ];
        assert_eq!(describe(&reports), "/a: pushed; /b: up to date");
    }
}
