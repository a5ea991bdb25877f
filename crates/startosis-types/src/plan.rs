//! Plan capture.
//!
//! A [`PlannedCall`] snapshots the bound arguments of one builtin call so
//! later script mutation cannot reach the committed step, and records the
//! call's canonical line. A [`Plan`] fingerprints its lines for idempotency
//! checks and diffing.

use sha2::{Digest, Sha256};
use startosis_args::ArgumentValuesSet;
use startosis_core::{CopyDiagnostic, Copier};
use tracing::{debug, warn};

const EMPTY_FINGERPRINT_LEN: usize = 64;

/// One captured builtin call.
#[derive(Debug, Clone)]
pub struct PlannedCall {
    /// Builtin or type name that was called.
    builtin: String,

    /// Detached copy of the bound arguments.
    arguments: ArgumentValuesSet,

    /// Canonical call line with only the caller-supplied arguments.
    line: String,

    /// Values the copier had to leave shared with the script.
    diagnostics: Vec<CopyDiagnostic>,
}

impl PlannedCall {
    /// Snapshot `arguments` and render the canonical line.
    pub fn capture(builtin: impl Into<String>, arguments: &ArgumentValuesSet) -> Self {
        let builtin = builtin.into();
        let mut copier = Copier::new();
        let arguments = arguments.copy_with(&mut copier);
        if !copier.is_sound() {
            for diagnostic in copier.diagnostics() {
                warn!(
                    builtin = %builtin,
                    type_name = %diagnostic.type_name,
                    "Captured call still shares a value with the script"
                );
            }
        }
        let line = arguments.render_call(&builtin);
        Self {
            builtin,
            arguments,
            line,
            diagnostics: copier.diagnostics().to_vec(),
        }
    }

    pub fn builtin(&self) -> &str {
        &self.builtin
    }

    pub fn arguments(&self) -> &ArgumentValuesSet {
        &self.arguments
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    /// The call with every default made explicit.
    pub fn resolved_line(&self) -> String {
        self.arguments.render_resolved(&self.builtin)
    }

    /// True if every value was detached from the script.
    pub fn is_sound(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn diagnostics(&self) -> &[CopyDiagnostic] {
        &self.diagnostics
    }

    fn digest(&self) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(self.line.as_bytes());
        hasher.finalize().to_vec()
    }
}

/// An ordered list of captured calls.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    calls: Vec<PlannedCall>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a call and return its index.
    pub fn record(&mut self, call: PlannedCall) -> usize {
        debug!(index = self.calls.len(), "Planned {}", call.line());
        self.calls.push(call);
        self.calls.len() - 1
    }

    /// Capture and append in one step.
    pub fn capture(&mut self, builtin: impl Into<String>, arguments: &ArgumentValuesSet) -> usize {
        self.record(PlannedCall::capture(builtin, arguments))
    }

    pub fn calls(&self) -> &[PlannedCall] {
        &self.calls
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn lines(&self) -> Vec<&str> {
        self.calls.iter().map(PlannedCall::line).collect()
    }

    /// Merkle root over the canonical lines, hex encoded.
    ///
    /// Equal line sequences give equal fingerprints; an empty plan is all
    /// zeros.
    pub fn fingerprint(&self) -> String {
        if self.calls.is_empty() {
            return "0".repeat(EMPTY_FINGERPRINT_LEN);
        }

        let mut hashes: Vec<Vec<u8>> = self.calls.iter().map(PlannedCall::digest).collect();
        while hashes.len() > 1 {
            let mut next_level = Vec::with_capacity((hashes.len() + 1) / 2);
            for chunk in hashes.chunks(2) {
                let mut hasher = Sha256::new();
                hasher.update(&chunk[0]);
                hasher.update(chunk.get(1).unwrap_or(&chunk[0]));
                next_level.push(hasher.finalize().to_vec());
            }
            hashes = next_level;
        }

        hashes
            .first()
            .map(|h| h.iter().map(|b| format!("{:02x}", b)).collect())
            .unwrap_or_else(|| "0".repeat(EMPTY_FINGERPRINT_LEN))
    }

    /// Index of the first call whose line differs from `other`, or where
    /// one plan ends before the other.
    pub fn first_divergence(&self, other: &Plan) -> Option<usize> {
        let common = self.calls.len().min(other.calls.len());
        (0..common)
            .find(|&i| self.calls[i].line != other.calls[i].line)
            .or_else(|| (self.calls.len() != other.calls.len()).then_some(common))
    }
}
