//! Scan orchestration.
//!
//! Walks the search space parameter by parameter, shallow escapes before deep
//! ones, trying every candidate path of every selected signature, and stops a
//! parameter as soon as one escape depth confirms an inclusion.
//!
//! [`LfiScanner::scan`] returns a lazy stream. It is not restartable: every
//! poll performs live requests, and calling `scan` again re-probes the target
//! from scratch.

use crate::catalog::SignatureCatalog;
use crate::config::{self, Config, MAX_DEPTH};
use crate::escape::{Escape, TraversalSpec};
use crate::probe::{LfiProbe, ProbeOutcome, Vulnerability};
use crate::signature::{Category, Signature};
use crate::target::ScanTarget;
use crate::transport::{HttpMethod, Transport};
use crate::Result;
use futures::stream::{self, Stream, StreamExt};
use log::{debug, info, warn};
use std::collections::VecDeque;
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Only test this parameter; all query parameters when `None`.
    pub param: Option<String>,
    pub depths: RangeInclusive<usize>,
    /// Literal traversal prefix. Replaces the depth range when set.
    pub prefix: Option<String>,
    pub separator: char,
    pub terminate_with_null: bool,
    pub os: Option<String>,
    pub method: HttpMethod,
    /// Keep testing the remaining signatures of a confirmed (param, depth).
    pub exhaustive: bool,
    pub categories: Vec<Category>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            param: None,
            depths: 0..=MAX_DEPTH,
            prefix: None,
            separator: '/',
            terminate_with_null: false,
            os: None,
            method: HttpMethod::Get,
            exhaustive: false,
            categories: Vec::new(),
        }
    }
}

impl From<&Config> for ScanOptions {
    fn from(config: &Config) -> Self {
        Self {
            param: None,
            depths: config.depth_range(),
            prefix: config.scan.prefix.clone(),
            separator: config.scan.separator,
            terminate_with_null: config.scan.terminate_with_null,
            os: config.scan.os.clone(),
            method: config.scan.method,
            exhaustive: config.scan.exhaustive,
            categories: config.scan.categories.clone(),
        }
    }
}

impl ScanOptions {
    /// Fails with `InvalidInput` on an inverted or overly deep depth range.
    /// The range is ignored when a literal prefix is set.
    pub fn validate(&self) -> Result<()> {
        if self.prefix.is_none() {
            config::validate_depths(*self.depths.start(), *self.depths.end())?;
        }
        Ok(())
    }

    /// Traversals to try for each parameter, in order. Built one at a time.
    pub fn traversals(&self) -> impl Iterator<Item = TraversalSpec> + '_ {
        let escapes: Box<dyn Iterator<Item = Escape> + Send + '_> = match &self.prefix {
            Some(prefix) => Box::new(std::iter::once(Escape::Prefix(prefix.clone()))),
            None => Box::new(self.depths.clone().map(Escape::Depth)),
        };

        escapes.map(move |escape| TraversalSpec {
            escape,
            separator: self.separator,
            terminate_with_null: self.terminate_with_null,
        })
    }

    pub fn traversal_count(&self) -> usize {
        match &self.prefix {
            Some(_) => 1,
            None if self.depths.start() > self.depths.end() => 0,
            None => (self.depths.end() - self.depths.start()).saturating_add(1),
        }
    }
}

/// Stop signal shared by every worker of a scan.
///
/// Workers check it before each new probe; a request already in flight is
/// allowed to finish.
#[derive(Debug, Clone, Default)]
pub struct ScanAbort(Arc<AtomicBool>);

impl ScanAbort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
struct ScanStats {
    probes: AtomicUsize,
    transport_failures: AtomicUsize,
    pairs: AtomicUsize,
}

impl ScanStats {
    fn reset(&self) {
        self.probes.store(0, Ordering::Relaxed);
        self.transport_failures.store(0, Ordering::Relaxed);
        self.pairs.store(0, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanCounts {
    pub probes: usize,
    pub transport_failures: usize,
    pub pairs: usize,
}

pub struct LfiScanner {
    signatures: Vec<Arc<Signature>>,
    transport: Arc<dyn Transport>,
    options: ScanOptions,
    abort: ScanAbort,
    stats: ScanStats,
}

struct Cursor<'a> {
    options: &'a ScanOptions,
    params: Vec<String>,
    param: usize,
    traversals: Box<dyn Iterator<Item = TraversalSpec> + Send + 'a>,
    pending: VecDeque<Vulnerability>,
}

impl<'a> Cursor<'a> {
    fn new(options: &'a ScanOptions, params: Vec<String>) -> Self {
        Self {
            options,
            params,
            param: 0,
            traversals: Box::new(options.traversals()),
            pending: VecDeque::new(),
        }
    }

    /// Moves on to the next parameter, restarting at the shallowest traversal.
    fn next_param(&mut self) {
        self.param += 1;
        self.traversals = Box::new(self.options.traversals());
    }
}

impl LfiScanner {
    /// Fails with `UnknownSignatureCategory` if a requested category has no
    /// signatures in `catalog`, and with `InvalidInput` on a bad depth range.
    pub fn new(
        catalog: &SignatureCatalog,
        transport: Arc<dyn Transport>,
        options: ScanOptions,
    ) -> Result<Self> {
        options.validate()?;
        let signatures = catalog.select(&options.categories)?;
        debug!(
            "Scanner armed with {} signatures (os: {})",
            signatures.len(),
            options.os.as_deref().unwrap_or("any")
        );

        Ok(Self {
            signatures,
            transport,
            options,
            abort: ScanAbort::new(),
            stats: ScanStats::default(),
        })
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    pub fn signatures(&self) -> &[Arc<Signature>] {
        &self.signatures
    }

    /// Handle that stops this scanner from issuing further probes.
    pub fn abort_handle(&self) -> ScanAbort {
        self.abort.clone()
    }

    /// Whether the abort handle has been triggered.
    pub fn is_aborted(&self) -> bool {
        self.abort.is_aborted()
    }

    /// Counters of the most recent scan.
    pub fn counts(&self) -> ScanCounts {
        ScanCounts {
            probes: self.stats.probes.load(Ordering::Relaxed),
            transport_failures: self.stats.transport_failures.load(Ordering::Relaxed),
            pairs: self.stats.pairs.load(Ordering::Relaxed),
        }
    }

    /// Lazily yields confirmed vulnerabilities, at most one (param, depth)
    /// pair per parameter. Resets [`LfiScanner::counts`].
    pub fn scan<'a>(&'a self, target: &'a ScanTarget) -> Result<impl Stream<Item = Vulnerability> + 'a> {
        let cursor = Cursor::new(
            &self.options,
            target.params_to_test(self.options.param.as_deref())?,
        );
        self.stats.reset();

        info!(
            "Scanning {} ({} parameters, {} traversals, {} signatures)",
            target,
            cursor.params.len(),
            self.options.traversal_count(),
            self.signatures.len()
        );

        Ok(stream::unfold(cursor, move |mut cursor| async move {
            loop {
                if let Some(vuln) = cursor.pending.pop_front() {
                    return Some((vuln, cursor));
                }

                if cursor.param >= cursor.params.len() || self.abort.is_aborted() {
                    self.log_completion();
                    return None;
                }

                let traversal = match cursor.traversals.next() {
                    Some(traversal) => traversal,
                    None => {
                        cursor.next_param();
                        continue;
                    }
                };

                let found = self
                    .scan_pair(target, &cursor.params[cursor.param], &traversal, None)
                    .await;

                if !found.is_empty() {
                    cursor.next_param();
                }
                cursor.pending.extend(found);
            }
        }))
    }

    /// The first confirmed vulnerability; probing stops once it is found.
    pub async fn first_vulnerability(&self, target: &ScanTarget) -> Result<Option<Vulnerability>> {
        let stream = self.scan(target)?;
        futures::pin_mut!(stream);
        Ok(stream.next().await)
    }

    /// Drains [`LfiScanner::scan`].
    pub async fn scan_all(&self, target: &ScanTarget) -> Result<Vec<Vulnerability>> {
        Ok(self.scan(target)?.collect().await)
    }

    /// Scans up to `workers` parameters concurrently. Depths of one parameter
    /// are still tried strictly in order. With `stop_on_first`, the first
    /// confirmed inclusion stops every worker from starting new probes.
    ///
    /// Results come back in parameter order.
    pub async fn scan_parallel(
        &self,
        target: &ScanTarget,
        workers: usize,
        stop_on_first: bool,
    ) -> Result<Vec<Vulnerability>> {
        let params = target.params_to_test(self.options.param.as_deref())?;
        let round = ScanAbort::new();
        self.stats.reset();

        info!(
            "Scanning {} parameters of {} with {} workers",
            params.len(),
            target,
            workers.max(1)
        );

        let results = stream::iter(params)
            .map(|param| {
                let round = &round;
                async move {
                    for traversal in self.options.traversals() {
                        if self.abort.is_aborted() || round.is_aborted() {
                            break;
                        }
                        let found = self.scan_pair(target, &param, &traversal, Some(round)).await;
                        if !found.is_empty() {
                            if stop_on_first {
                                round.abort();
                            }
                            return found;
                        }
                    }
                    Vec::new()
                }
            })
            .buffered(workers.max(1))
            .collect::<Vec<_>>()
            .await;

        self.log_completion();
        Ok(results.into_iter().flatten().collect())
    }

    /// Probes every candidate path of every signature for one (param,
    /// traversal) pair.
    async fn scan_pair(
        &self,
        target: &ScanTarget,
        param: &str,
        traversal: &TraversalSpec,
        round: Option<&ScanAbort>,
    ) -> Vec<Vulnerability> {
        self.stats.pairs.fetch_add(1, Ordering::Relaxed);
        debug!("Testing parameter '{}' with {}", param, traversal);

        let probe = LfiProbe::new(
            target.clone(),
            param,
            traversal.clone(),
            Arc::clone(&self.transport),
        )
        .with_method(self.options.method);

        let os = self.options.os.as_deref();
        let mut found = Vec::new();

        'signatures: for signature in &self.signatures {
            for path in signature.paths_for(os) {
                if self.abort.is_aborted() || round.map_or(false, ScanAbort::is_aborted) {
                    break 'signatures;
                }

                self.stats.probes.fetch_add(1, Ordering::Relaxed);
                match probe.probe_path(signature, path).await {
                    ProbeOutcome::Matched(vuln) => {
                        info!(
                            "{} includes {} via '{}' ({})",
                            target, vuln.matched_path, param, traversal
                        );
                        found.push(vuln);
                        if self.options.exhaustive {
                            continue 'signatures;
                        }
                        break 'signatures;
                    }
                    ProbeOutcome::NoMatch => {}
                    ProbeOutcome::TransportFailed(_) => {
                        self.stats.transport_failures.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        }

        found
    }

    fn log_completion(&self) {
        let counts = self.counts();
        if counts.probes > 0 && counts.transport_failures == counts.probes {
            warn!(
                "All {} probes failed at the transport level; no conclusion can be drawn",
                counts.probes
            );
        } else {
            debug!(
                "Scan finished: {} probes over {} pairs, {} transport failures",
                counts.probes, counts.pairs, counts.transport_failures
            );
        }
    }
}
