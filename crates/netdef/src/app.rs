//! Main application logic.
//!
//! Loads the project, runs one pass over it, writes the project back so the
//! resolved state persists, and optionally checks for updates.

use crate::{cli::CliArgs, config::AppConfig};
use netdef_core::version::CheckState;
use netdef_core::{
    evaluate, prepare_project, read_version_file, run_pass, CompileOutcome, DefinitionCompiler, HttpVersionSource,
    Project, SchemaTemplateSource, TemplateCache, TemplateRules, VersionChecker, VersionVerdict,
};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// What a run did, for the caller's exit status.
#[derive(Debug)]
pub struct RunSummary {
    pub prepared_only: bool,
    pub outcome: Option<CompileOutcome>,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        self.outcome
            .as_ref()
            .and_then(|outcome| outcome.report())
            .map(|report| !report.is_clean())
            .unwrap_or(false)
    }
}

pub struct Application {
    config: AppConfig,
    project_path: PathBuf,
    dry_run: bool,
    check_updates: bool,
}

impl Application {
    /// Applies CLI overrides on top of `config` and validates the result.
    pub fn new(args: CliArgs, mut config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        if let Some(output_dir) = args.output_dir {
            config.output.directory = output_dir.to_string_lossy().to_string();
        }

        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }

        if args.json_logs {
            config.logging.json_format = true;
        }

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        }
        info!("✅ Configuration loaded and validated successfully");

        Ok(Self {
            check_updates: args.check_updates || config.version_check.enabled,
            config,
            project_path: args.project_path,
            dry_run: args.dry_run,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub async fn run(self) -> Result<RunSummary, Box<dyn std::error::Error>> {
        self.log_configuration_summary();

        let checker = if self.check_updates {
            self.start_version_check()
        } else {
            None
        };

        let mut project = load_project(&self.project_path).await?;
        project.refresh_active_scene();

        let rules: TemplateRules = self.config.to_template_rules();
        let mut cache = TemplateCache::new(Box::new(SchemaTemplateSource::new(self.config.search_paths())));

        let summary = if self.dry_run {
            let prepared = prepare_project(&mut project, &mut cache, &rules);
            info!("🔍 Dry run: prepared {} networked object(s), nothing written", prepared);
            RunSummary {
                prepared_only: true,
                outcome: None,
            }
        } else {
            let compiler = DefinitionCompiler::new(&self.config.output.directory);
            let outcome = run_pass(&mut project, &mut cache, &rules, &compiler)?;
            log_outcome(&outcome);
            RunSummary {
                prepared_only: false,
                outcome: Some(outcome),
            }
        };

        save_project(&self.project_path, &project).await?;

        if let Some(checker) = checker {
            self.finish_version_check(&checker);
        }

        Ok(summary)
    }

    fn start_version_check(&self) -> Option<VersionChecker> {
        let settings = &self.config.version_check;
        let local_version = match read_version_file(&settings.addon_version_file) {
            Ok(version) => version,
            Err(e) => {
                warn!("⚠️ Skipping update check: {}", e);
                return None;
            }
        };

        let checker = VersionChecker::new(HttpVersionSource::new(self.config.version_timeout()));
        checker.check_version(&settings.url, &local_version);
        info!("🌐 Checking for updates (local version {})", local_version);
        Some(checker)
    }

    fn finish_version_check(&self, checker: &VersionChecker) {
        let settings = &self.config.version_check;

        let Some(result) = checker.wait(self.config.version_timeout()) else {
            warn!("⚠️ Update check did not finish in time");
            return;
        };

        let network_version = if result.state == CheckState::Success {
            match read_version_file(&settings.network_version_file) {
                Ok(version) => version,
                Err(e) => {
                    warn!("⚠️ Could not read the network version: {}", e);
                    return;
                }
            }
        } else {
            String::new()
        };

        match evaluate(&result, &network_version, &settings.mismatch_url) {
            VersionVerdict::UpToDate => {}
            VersionVerdict::Mismatch { url } => warn!("⚠️ A newer version is available: {}", url),
            VersionVerdict::Failed { message } => error!("❌ {}", message),
        }
    }

    fn log_configuration_summary(&self) {
        info!("📋 Configuration Summary:");
        info!("  📂 Project: {}", self.project_path.display());
        info!("  💾 Output directory: {}", self.config.output.directory);
        info!("  🧩 Template search paths: {:?}", self.config.templates.search_paths);
        info!("  🔒 Built-in modules: {}", self.config.templates.builtin_modules.len());
    }
}

fn log_outcome(outcome: &CompileOutcome) {
    match outcome {
        CompileOutcome::NoActiveScene => warn!("⚠️ No scene uses networking, nothing was written"),
        CompileOutcome::Compiled(report) => {
            info!(
                "📊 Written: {} | Removed: {} | Failed: {}",
                report.written.len(),
                report.removed.len(),
                report.failures.len()
            );
            for failure in &report.failures {
                error!("❌ {}: {}", failure.path.display(), failure.error);
            }
        }
    }
}

pub async fn load_project(path: &Path) -> Result<Project, Box<dyn std::error::Error>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("Failed to read project {}: {e}", path.display()))?;
    let project: Project =
        serde_json::from_str(&content).map_err(|e| format!("Failed to parse project {}: {e}", path.display()))?;
    Ok(project)
}

pub async fn save_project(path: &Path, project: &Project) -> Result<(), Box<dyn std::error::Error>> {
    let content = serde_json::to_string_pretty(project)?;
    tokio::fs::write(path, content)
        .await
        .map_err(|e| format!("Failed to write project {}: {e}", path.display()))?;
    Ok(())
}
