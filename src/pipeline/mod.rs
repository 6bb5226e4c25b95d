//! Filing Pipeline
//!
//! Walks a folder tree depth-first. For every file: extract content,
//! classify, compute the canonical name, then rename and move (Inbox) or
//! rename and recommend (Maintenance). One failing file never stops the walk.

pub mod context;


use crate::ai::adapter::{ClassifierAdapter, ClassifyRequest};
use crate::ai::types::Confidence;
use crate::categories::CategoryRegistry;
use crate::config::TimeContextSettings;
use crate::error::FilingError;
use crate::extract::ContentExtractor;
use crate::naming::{canonical_name, is_canonical_name};
use crate::report::{AuditAction, AuditEvent, AuditLog, RunStats};
use crate::store::{folder_path, FileRecord, ListFilter, ObjectStore};
use context::context_hint;
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;

const INBOX_LABEL: &str = "Inbox";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Untriaged files: rename, then move out when confident
    Inbox,
    /// Audit pass over filed content: canonical names are never touched
    Maintenance,
}

#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    pub mode: ScanMode,
    pub dry_run: bool,
    /// Stop after this many processed files
    pub limit: Option<usize>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            mode: ScanMode::Maintenance,
            dry_run: true,
            limit: None,
        }
    }
}

enum FileOutcome {
    Processed,
    Skipped,
}

/// A file after classification, before any mutation
struct Decision {
    new_name: String,
    confidence: Confidence,
    target_id: Option<String>,
}

pub struct FilingPipeline {
    store: Arc<dyn ObjectStore>,
    registry: CategoryRegistry,
    adapter: ClassifierAdapter,
    audit: AuditLog,
    stats: RunStats,
    inbox_id: String,
    time_settings: TimeContextSettings,
    options: ScanOptions,
}

impl FilingPipeline {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        registry: CategoryRegistry,
        adapter: ClassifierAdapter,
        audit: AuditLog,
        inbox_id: &str,
        time_settings: TimeContextSettings,
    ) -> Self {
        Self {
            store,
            registry,
            adapter,
            audit,
            stats: RunStats::new(),
            inbox_id: inbox_id.to_string(),
            time_settings,
            options: ScanOptions::default(),
        }
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn into_stats(self) -> RunStats {
        self.stats
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    pub fn adapter(&self) -> &ClassifierAdapter {
        &self.adapter
    }

    /// Scan `folder_id` and everything beneath it
    pub async fn run(&mut self, folder_id: &str, options: ScanOptions) -> &RunStats {
        self.options = options;
        tracing::info!(
            "Starting {:?} scan (dry run: {}, limit: {:?}, run {})",
            options.mode,
            options.dry_run,
            options.limit,
            self.audit.run_id()
        );
        let label = self.root_label(folder_id).await;
        self.scan_folder(folder_id.to_string(), label).await;
        &self.stats
    }

    /// Context label for the folder a run starts from
    async fn root_label(&self, folder_id: &str) -> String {
        if folder_id == self.inbox_id {
            return INBOX_LABEL.to_string();
        }
        match self.store.get(folder_id).await {
            Ok(folder) => folder.name,
            Err(e) => {
                tracing::debug!("Could not name folder {}: {}", folder_id, e);
                folder_id.to_string()
            }
        }
    }

    fn limit_reached(&self) -> bool {
        self.options
            .limit
            .is_some_and(|limit| self.stats.processed >= limit)
    }

    fn scan_folder(&mut self, folder_id: String, context: String) -> BoxFuture<'_, ()> {
        async move {
            let label = if folder_id == self.inbox_id {
                INBOX_LABEL.to_string()
            } else {
                context
            };
            tracing::info!("Scanning folder {} ({})...", label, folder_id);

            let items = match self.store.list(&folder_id, &ListFilter::children()).await {
                Ok(items) => items,
                Err(e) => {
                    tracing::error!("  [Error] Listing {}: {}", label, e);
                    self.stats.errors += 1;
                    return;
                }
            };
            tracing::info!("Found {} items in {}. Processing...", items.len(), label);

            for item in items {
                if self.limit_reached() {
                    tracing::info!("Limit reached, stopping.");
                    return;
                }

                if item.is_folder() {
                    self.scan_folder(item.id.clone(), format!("{}/{}", label, item.name))
                        .await;
                    continue;
                }

                if self.options.mode == ScanMode::Maintenance && is_canonical_name(&item.name) {
                    tracing::debug!("  [Skip] Already named: {}", item.name);
                    self.stats.skipped += 1;
                    continue;
                }

                match self.process_file(&item, &folder_id, &label).await {
                    Ok(FileOutcome::Processed) => self.stats.processed += 1,
                    Ok(FileOutcome::Skipped) => self.stats.skipped += 1,
                    Err(e) => {
                        tracing::error!("  [Error] {}: {}", item.name, e);
                        self.stats.errors += 1;
                    }
                }
            }
        }
        .boxed()
    }

    async fn process_file(
        &mut self,
        file: &FileRecord,
        folder_id: &str,
        label: &str,
    ) -> Result<FileOutcome, FilingError> {
        let content = ContentExtractor::new(self.store.as_ref())
            .extract(file)
            .await?;
        if content.is_empty() {
            tracing::info!("  [Skip] Empty content: {}", file.name);
            return Ok(FileOutcome::Skipped);
        }

        let hint = context_hint(label, file.created_time, &self.time_settings);
        let categories = self.registry.prompt_string();
        let classification = self
            .adapter
            .classify(&ClassifyRequest {
                content: &content.bytes,
                content_type: &content.content_type,
                file_name: &file.name,
                categories: &categories,
                context_hint: &hint,
                file_id: Some(file.id.as_str()),
                created_time: file.created_time,
            })
            .await;

        let decision = Decision {
            new_name: canonical_name(&classification, &file.name, file.created_time),
            confidence: classification.confidence(),
            target_id: self.registry.resolve(classification.category()),
        };
        tracing::info!(
            "  [AI] {} -> {} ({}, {})",
            file.name,
            decision.new_name,
            classification.category(),
            decision.confidence
        );

        // The listed folder is always a parent, even for multi-parent items
        let current_parent = folder_id;
        if self.options.dry_run {
            self.log_plan(file, current_parent, &decision);
            return Ok(FileOutcome::Processed);
        }

        match self.options.mode {
            ScanMode::Inbox => self.apply_inbox(file, current_parent, &decision).await?,
            ScanMode::Maintenance => self.apply_maintenance(file, current_parent, &decision).await?,
        }
        Ok(FileOutcome::Processed)
    }

    /// Whether the decision relocates the file
    fn should_move<'d>(decision: &'d Decision, current_parent: &str) -> Option<&'d str> {
        decision
            .target_id
            .as_deref()
            .filter(|target| decision.confidence.is_high() && *target != current_parent)
    }

    fn log_plan(&self, file: &FileRecord, current_parent: &str, decision: &Decision) {
        let rename = match self.options.mode {
            ScanMode::Inbox => decision.new_name != file.name,
            ScanMode::Maintenance => decision.confidence.is_high() && decision.new_name != file.name,
        };
        if rename {
            tracing::info!("  [Plan] Rename -> {}", decision.new_name);
        }
        if let Some(target) = Self::should_move(decision, current_parent) {
            tracing::info!("  [Plan] Move -> {}", target);
        }
    }

    async fn apply_inbox(
        &mut self,
        file: &FileRecord,
        current_parent: &str,
        decision: &Decision,
    ) -> Result<(), FilingError> {
        let renamed = decision.new_name != file.name;
        if renamed {
            self.store.update_name(&file.id, &decision.new_name).await?;
            self.stats.renamed += 1;
            tracing::info!("  [Renamed] {}", decision.new_name);

            let target_path = folder_path(self.store.as_ref(), decision.target_id.as_deref()).await;
            self.audit.record(AuditEvent {
                file_id: &file.id,
                original_name: &file.name,
                new_name: &decision.new_name,
                target_folder_id: decision.target_id.as_deref(),
                target_folder_path: &target_path,
                action: AuditAction::AutoRename,
            });
        }

        match Self::should_move(decision, current_parent) {
            Some(target) => {
                self.store.move_file(&file.id, current_parent, target).await?;
                self.stats.moved += 1;

                let target_path = folder_path(self.store.as_ref(), Some(target)).await;
                tracing::info!("  [Moved] -> {}", target_path);
                self.audit.record(AuditEvent {
                    file_id: &file.id,
                    original_name: &file.name,
                    new_name: &decision.new_name,
                    target_folder_id: Some(target),
                    target_folder_path: &target_path,
                    action: AuditAction::AutoMove,
                });
            }
            None if decision.target_id.as_deref() == Some(current_parent) => {
                tracing::debug!("  Already in target folder: {}", decision.new_name);
            }
            None if renamed => {
                tracing::warn!("  [Renamed Only] {} (Low conf/No target)", decision.new_name);
            }
            None => {}
        }
        Ok(())
    }

    async fn apply_maintenance(
        &mut self,
        file: &FileRecord,
        current_parent: &str,
        decision: &Decision,
    ) -> Result<(), FilingError> {
        if decision.confidence.is_high() && decision.new_name != file.name {
            self.store.update_name(&file.id, &decision.new_name).await?;
            self.stats.renamed += 1;
            tracing::info!("  [Renamed] {}", decision.new_name);

            let here = folder_path(self.store.as_ref(), Some(current_parent)).await;
            self.audit.record(AuditEvent {
                file_id: &file.id,
                original_name: &file.name,
                new_name: &decision.new_name,
                target_folder_id: Some(current_parent),
                target_folder_path: &here,
                action: AuditAction::MaintenanceRename,
            });
        }

        if let Some(target) = Self::should_move(decision, current_parent) {
            let target_path = folder_path(self.store.as_ref(), Some(target)).await;
            tracing::info!("  [Recommend] Move {} -> {}", decision.new_name, target_path);
            self.audit.record(AuditEvent {
                file_id: &file.id,
                original_name: &file.name,
                new_name: &decision.new_name,
                target_folder_id: Some(target),
                target_folder_path: &target_path,
                action: AuditAction::RecommendMove,
            });
        }
        Ok(())
    }
}
