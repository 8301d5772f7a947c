//! Pipeline driver: one strictly sequential pass over the wiki.
//!
//! Every step isolates its own failures: a problem with one candidate or one
//! document becomes a diagnostics entry and the run moves on. Only a failed
//! discovery query ends the run early, and the diagnostics report is written
//! in every case.

use crate::candidate::{resolve, Candidate};
use crate::classify::{classify, status_of, Action};
use crate::config::BotConfig;
use crate::diagnostics::Diagnostics;
use crate::dispatch::{append_backlog, backlog_entry, tag_gallery, TagOutcome};
use crate::error::{EngineError, Result};
use crate::ports::{DocumentStore, QueryService};
use crate::promotion::{notify_text, populate_staging, tag_file_page};
use crate::removal::{listed_keys, remove};
use crate::report::RunReport;
use crate::sample::{render_sample, sample_scope};
use crate::scope_index::{merge, ScopeIndexEntry};
use crate::sweep::{append_to_gallery, SweepPlan, MOVE_MARKER};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::time::Instant;
use vic_wikitext::{gallery_target, normalize_title};

/// Candidates sorted by outcome of classification and resolution
#[derive(Debug, Default)]
pub struct Triage {
    pub promote: Vec<Candidate>,
    pub reject: Vec<Candidate>,

    /// Identifiers whose document could not be resolved, with the reason
    pub errors: Vec<(String, EngineError)>,
}

impl Triage {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.promote.is_empty() && self.reject.is_empty()
    }

    /// Listing keys of every promoted or rejected candidate
    #[must_use]
    pub fn processed_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        for candidate in self.promote.iter().chain(&self.reject) {
            for key in candidate.listing_keys() {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }
}

pub struct Pipeline<S, Q> {
    store: S,
    query: Q,
    config: BotConfig,
    diagnostics: Diagnostics,
    report: RunReport,
    flushed: bool,
}

impl<S: DocumentStore, Q: QueryService> Pipeline<S, Q> {
    pub fn new(store: S, query: Q, config: BotConfig) -> Self {
        Self {
            store,
            query,
            config,
            diagnostics: Diagnostics::new(),
            report: RunReport::new(),
            flushed: false,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    /// Full run. The diagnostics report is written even when discovery fails.
    pub async fn run(&mut self) -> Result<RunReport> {
        let started = Instant::now();
        log::info!("Starting run against {}", self.config.api_url);

        let outcome = self.run_steps().await;
        if let Err(err) = self.flush_diagnostics().await {
            log::error!("Failed to write diagnostics report: {err}");
        }
        self.report.time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        outcome?;
        log::info!("Run completed: {:?}", self.report);
        Ok(self.report.clone())
    }

    async fn run_steps(&mut self) -> Result<()> {
        self.refresh_sample().await;

        let discovered = self.discover_candidates().await?;
        let triage = self.classify_and_resolve(&discovered).await;

        self.reconcile_scope_index(&triage.promote).await;
        if triage.is_empty() {
            log::info!("No candidates to process");
        } else {
            self.remove_processed(&triage.processed_keys()).await;
        }

        self.sweep_moves().await;
        self.apply_promotions(&triage.promote).await;
        self.dispatch_galleries(&triage.promote).await;
        Ok(())
    }

    /// Recently edited candidate documents and their tags, keyed by identifier
    pub async fn discover_candidates(&mut self) -> Result<BTreeMap<String, BTreeSet<String>>> {
        let pages = match self
            .query
            .recently_edited(&self.config.candidate_prefix, self.config.lookback_days)
            .await
        {
            Ok(pages) => pages,
            Err(err) => {
                let err = EngineError::DiscoveryFailure(err.to_string());
                self.diagnostics.record(format!("In candidate evaluation: {err}"));
                return Err(err);
            }
        };

        let prefix = normalize_title(&self.config.candidate_prefix);
        let mut discovered = BTreeMap::new();
        for page in pages {
            let title = normalize_title(&page.title);
            let Some(identifier) = title.strip_prefix(prefix.as_str()) else {
                log::debug!("Ignoring {} outside the candidate prefix", page.title);
                continue;
            };
            if identifier.is_empty() {
                continue;
            }
            if page.tags.is_empty() {
                log::debug!("Candidate {} has no tags", page.title);
                continue;
            }
            discovered.insert(identifier.replace('_', " "), page.tags);
        }

        self.report.discovered = discovered.len();
        log::info!("Discovered {} candidate document(s)", discovered.len());
        Ok(discovered)
    }

    /// Keys listed on every participating listing document
    async fn listed_candidates(&mut self) -> HashSet<String> {
        let mut listed = HashSet::new();
        for page in self.config.listing_pages.clone() {
            match self.store.fetch_optional(&page, true).await {
                Ok(Some(text)) if text.contains(&self.config.listing_marker) => {
                    listed.extend(listed_keys(&text));
                }
                Ok(Some(_)) => {
                    log::debug!(
                        "Marker {} not found on [[{page}]]; ignoring it",
                        self.config.listing_marker
                    );
                }
                Ok(None) => self.record("In candidate evaluation", &EngineError::TargetMissing(page)),
                Err(err) => self.record("In candidate evaluation", &err.into()),
            }
        }
        listed
    }

    pub async fn classify_and_resolve(
        &mut self,
        discovered: &BTreeMap<String, BTreeSet<String>>,
    ) -> Triage {
        let listed = self.listed_candidates().await;
        let mut triage = Triage::default();

        for (identifier, tags) in discovered {
            let status = status_of(tags);
            let action = classify(tags);
            if action == Action::NoAction {
                log::debug!("Nothing to do for {identifier} ({status:?})");
                self.report.skipped += 1;
                continue;
            }

            match self.resolve_candidate(identifier).await {
                Ok(candidate) => {
                    let candidate = candidate.with_status(status);
                    if !candidate.listing_keys().iter().any(|key| listed.contains(key)) {
                        log::debug!("Candidate {identifier} is not listed; assuming it was handled");
                        self.report.skipped += 1;
                        continue;
                    }
                    log::info!(
                        "Handling {identifier}: {} on {} ({status:?}), nominated by {}",
                        candidate.image,
                        candidate.subpage,
                        candidate.nominator_user
                    );
                    match action {
                        Action::Promote => triage.promote.push(candidate),
                        Action::Reject => triage.reject.push(candidate),
                        Action::NoAction => {}
                    }
                }
                Err(err) => {
                    let title = self.config.candidate_title(identifier);
                    self.record(&format!("In candidate evaluation for [[{title}]]"), &err);
                    self.report.skipped += 1;
                    triage.errors.push((identifier.clone(), err));
                }
            }
        }

        self.report.promoted = triage.promote.len();
        self.report.rejected = triage.reject.len();
        triage
    }

    async fn resolve_candidate(&self, identifier: &str) -> Result<Candidate> {
        let title = self.config.candidate_title(identifier);
        let document = self
            .store
            .fetch_optional(&title, true)
            .await?
            .ok_or(EngineError::TargetMissing(title))?;
        resolve(identifier, &document)
    }

    /// File page tags, staging lines and nominator notices for every promotion
    pub async fn apply_promotions(&mut self, promote: &[Candidate]) {
        for candidate in promote {
            if let Err(err) = self.tag_file(candidate).await {
                self.record("In image tagging", &err);
            }
        }

        if !promote.is_empty() {
            if let Err(err) = self.populate_staging(promote).await {
                self.record("In gallery population", &err);
            }
        }

        let mut by_nominator: BTreeMap<&str, Vec<&Candidate>> = BTreeMap::new();
        for candidate in promote {
            by_nominator
                .entry(candidate.nominator_user.as_str())
                .or_default()
                .push(candidate);
        }
        for (user, candidates) in by_nominator {
            if let Err(err) = self.notify(user, &candidates).await {
                self.record(&format!("In notification of {user}"), &err);
            }
        }
    }

    async fn tag_file(&mut self, candidate: &Candidate) -> Result<()> {
        let title = format!("File:{}", candidate.image);
        let text = self
            .store
            .fetch_optional(&title, true)
            .await?
            .ok_or_else(|| EngineError::TargetMissing(title.clone()))?;
        match tag_file_page(&text, candidate) {
            Some(tagged) => self.save(&title, &tagged, "tag promoted Valued Image").await,
            None => {
                log::debug!("[[{title}]] is already tagged");
                Ok(())
            }
        }
    }

    async fn populate_staging(&mut self, promote: &[Candidate]) -> Result<()> {
        let title = self.config.staging_gallery_page.clone();
        let text = self
            .store
            .fetch_optional(&title, true)
            .await?
            .ok_or_else(|| EngineError::TargetMissing(title.clone()))?;
        let populated = populate_staging(&text, promote)
            .ok_or_else(|| EngineError::MalformedGallery(title.clone()))?;
        if populated == text {
            return Ok(());
        }
        self.save(
            &title,
            &populated,
            "preparing newly promoted [[COM:VI|Valued Images]] for sorting",
        )
        .await
    }

    async fn notify(&mut self, user: &str, candidates: &[&Candidate]) -> Result<()> {
        let title = format!("User talk:{user}");
        let existing = self.store.fetch_optional(&title, true).await?;
        match notify_text(existing.as_deref(), user, candidates) {
            Some(text) => {
                log::info!("Notifying {user} of {} promotion(s)", candidates.len());
                self.save(&title, &text, "notify user of promoted Valued Image(s)")
                    .await
            }
            None => Ok(()),
        }
    }

    /// Merge the promoted scopes into the scope index and re-sort it. Runs
    /// every time, since the index may have been edited by hand.
    pub async fn reconcile_scope_index(&mut self, promote: &[Candidate]) {
        let title = self.config.scope_index_page.clone();
        let text = match self.store.fetch_optional(&title, true).await {
            Ok(Some(text)) => text,
            Ok(None) => {
                self.record("In scope index", &EngineError::TargetMissing(title));
                return;
            }
            Err(err) => {
                self.record("In scope index", &err.into());
                return;
            }
        };

        let entries: Vec<ScopeIndexEntry> = promote.iter().map(ScopeIndexEntry::from_candidate).collect();
        let merged = merge(&text, &entries);
        if merged == text {
            log::debug!("Scope index already up to date");
            return;
        }
        if let Err(err) = self
            .save(&title, &merged, "insert into and sort alphabetical VI list by scope")
            .await
        {
            self.record("In scope index", &err);
        }
    }

    /// Strip `keys` from every listing document
    pub async fn remove_processed<K: AsRef<str>>(&mut self, keys: &[K]) {
        for page in self.config.listing_pages.clone() {
            let text = match self.store.fetch_optional(&page, true).await {
                Ok(Some(text)) => text,
                Ok(None) => {
                    self.record("In listing cleanup", &EngineError::TargetMissing(page));
                    continue;
                }
                Err(err) => {
                    self.record("In listing cleanup", &err.into());
                    continue;
                }
            };

            let cleaned = remove(&text, keys);
            if cleaned == text {
                continue;
            }
            if let Err(err) = self.save(&page, &cleaned, "remove processed nominations").await {
                self.record("In listing cleanup", &err);
            }
        }
    }

    /// Mark each promoted file in its topic gallery, falling back to the backlog
    pub async fn dispatch_galleries(&mut self, promote: &[Candidate]) {
        for candidate in promote {
            let target = gallery_target(&candidate.scope);
            let matched = match self.tag_in_gallery(&target, candidate).await {
                Ok(matched) => matched,
                Err(err) => {
                    self.record("In gallery tagging", &err);
                    false
                }
            };
            if matched {
                continue;
            }
            if let Err(err) = self.add_to_backlog(candidate).await {
                self.record("In gallery tagging", &err);
            }
        }
    }

    async fn tag_in_gallery(&mut self, target: &str, candidate: &Candidate) -> Result<bool> {
        let Some(text) = self.store.fetch_optional(target, true).await? else {
            log::warn!("Gallery [[{target}]] does not exist");
            return Ok(false);
        };
        match tag_gallery(&text, &candidate.image) {
            TagOutcome::Tagged(tagged) => {
                self.save(target, &tagged, "tag images in galleries").await?;
                Ok(true)
            }
            TagOutcome::AlreadyTagged => Ok(true),
            TagOutcome::NotFound => {
                log::debug!("{} not found in [[{target}]]", candidate.image);
                Ok(false)
            }
        }
    }

    async fn add_to_backlog(&mut self, candidate: &Candidate) -> Result<()> {
        let title = self.config.gallery_backlog_page.clone();
        let existing = self.store.fetch_optional(&title, true).await?;
        match append_backlog(existing.as_deref(), &backlog_entry(candidate)) {
            Some(text) => self.save(&title, &text, "tag images in galleries").await,
            None => Ok(()),
        }
    }

    /// Move sorted staging lines into their topic galleries
    pub async fn sweep_moves(&mut self) {
        let staging = self.config.staging_gallery_page.clone();
        let text = match self.store.fetch_optional(&staging, true).await {
            Ok(Some(text)) => text,
            Ok(None) => {
                log::debug!("[[{staging}]] does not exist; skipping sweep");
                return;
            }
            Err(err) => {
                self.record("In gallery population", &err.into());
                return;
            }
        };

        let plan = SweepPlan::new(&text);
        for line in plan.unreadable() {
            self.diagnostics.record(format!(
                "In gallery population: unreadable {MOVE_MARKER} marker on [[{staging}]]: {line}"
            ));
        }
        if plan.is_empty() {
            log::debug!("Nothing to sweep on [[{staging}]]");
            return;
        }

        let mut completed = BTreeSet::new();
        for topic in plan.topics() {
            let lines = plan.lines_for(topic);
            match self.move_topic(topic, &lines).await {
                Ok(()) => {
                    completed.insert(topic.to_string());
                }
                Err(err) => {
                    self.record("In gallery population", &err);
                    for line in &lines {
                        log::warn!("Kept on staging: {line}");
                    }
                }
            }
        }

        if completed.is_empty() {
            return;
        }
        let swept = plan.render(&completed);
        if swept == text {
            return;
        }
        if let Err(err) = self
            .save(
                &staging,
                &swept,
                "add recently categorized [[COM:VI|valued images]] to the [[:Category:Galleries of valued images|VI galleries]]",
            )
            .await
        {
            self.record("In gallery population", &err);
        }
    }

    async fn move_topic(&mut self, topic: &str, lines: &[String]) -> Result<()> {
        let title = format!("{}{}", self.config.topic_gallery_prefix, topic);
        let text = self
            .store
            .fetch_optional(&title, true)
            .await?
            .ok_or_else(|| EngineError::TargetMissing(title.clone()))?;
        let updated = append_to_gallery(&text, lines)
            .ok_or_else(|| EngineError::MalformedGallery(title.clone()))?;
        if updated == text {
            return Ok(());
        }
        self.save(
            &title,
            &updated,
            "add recently categorized [[COM:VI|valued images]] to the [[:Category:Galleries of valued images|VI galleries]]",
        )
        .await
    }

    /// Replace the sample gallery with randomly chosen promoted images
    pub async fn refresh_sample(&mut self) {
        let images = match self.query.sample_random(self.config.sample_size).await {
            Ok(images) => images,
            Err(err) => {
                self.record("In sample gallery generation", &err.into());
                return;
            }
        };

        let mut entries = Vec::with_capacity(images.len());
        for image in images {
            let title = format!("File:{image}");
            match self.store.fetch_optional(&title, true).await {
                Ok(Some(text)) => match sample_scope(&text) {
                    Some(scope) => entries.push((image, scope)),
                    None => self.diagnostics.record(format!(
                        "In sample gallery generation: failed to parse VI template on [[{title}]]"
                    )),
                },
                Ok(None) => self.record(
                    "In sample gallery generation",
                    &EngineError::TargetMissing(title),
                ),
                Err(err) => self.record("In sample gallery generation", &err.into()),
            }
        }

        if entries.is_empty() {
            return;
        }
        let title = self.config.sample_page.clone();
        if let Err(err) = self
            .save(&title, &render_sample(&entries), "update VI sample gallery")
            .await
        {
            self.record("In sample gallery generation", &err);
        }
    }

    /// Write the diagnostics report. Only the first call writes.
    pub async fn flush_diagnostics(&mut self) -> Result<usize> {
        if self.flushed {
            log::warn!("Diagnostics were already flushed");
            return Ok(0);
        }
        self.flushed = true;

        let diagnostics = std::mem::take(&mut self.diagnostics);
        self.report.diagnostics = diagnostics.len();
        let summary = self.config.summary("report task errors");
        let written = diagnostics
            .flush(&self.store, &self.config.diagnostics_page, &summary)
            .await?;
        self.report.saved += 1;
        Ok(written)
    }

    fn record(&mut self, context: &str, err: &EngineError) {
        if err.is_retryable() {
            self.diagnostics
                .record(format!("{context}: {err} (retried on the next run)"));
        } else {
            self.diagnostics.record(format!("{context}: {err}"));
        }
    }

    async fn save(&mut self, title: &str, text: &str, action: &str) -> Result<()> {
        let summary = self.config.summary(action);
        match self.store.save(title, text, &summary).await {
            Ok(()) => {
                self.report.saved += 1;
                log::info!("Saved [[{title}]]: {action}");
                Ok(())
            }
            Err(err) if err.is_refusal() => Err(EngineError::SaveConflict {
                title: title.to_string(),
                source: err,
            }),
            Err(err) => Err(err.into()),
        }
    }
}
