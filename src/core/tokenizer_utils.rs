/*
 * This module provides token counting for the session.
 * It defines an abstraction `TokenCounterOperations` for a real subword tokenizer,
 * the concrete `CoreTikTokenCounter` backed by `tiktoken-rs`, the single fallback
 * estimator used whenever the tokenizer is missing or failing, and the
 * `TokenAccountant` that memoizes counts for the current session.
 *
 * Two kinds of counts are cached:
 *   - the base count of a file's content, keyed by content checksum and computed at
 *     most once per distinct content;
 *   - the count of a file's full rendered block (path marker + fence + content),
 *     keyed by path and tagged with the epoch it was computed in. Bumping the epoch
 *     invalidates every rendered count at once.
 */
use crate::core::repo_file::RepoFile;
use log::{error, warn};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tiktoken_rs::{CoreBPE, cl100k_base};

/* Multiplier applied to the whitespace word count by the fallback estimator. */
pub const FALLBACK_TOKENS_PER_WORD: f64 = 1.3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizerError {
    Unavailable(String),
}

impl std::fmt::Display for TokenizerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenizerError::Unavailable(reason) => write!(f, "Tokenizer unavailable: {reason}"),
        }
    }
}

impl std::error::Error for TokenizerError {}

/*
 * Defines the contract for a real tokenizer. Implementations may fail, in which
 * case the accountant switches to the fallback estimator for that call.
 */
pub trait TokenCounterOperations: Send + Sync {
    fn count_tokens(&self, text: &str) -> Result<usize, TokenizerError>;
}

/*
 * A `TokenCounterOperations` implementation using the `cl100k_base` BPE from
 * `tiktoken-rs`. The BPE tables are built once per process on first use.
 */
pub struct CoreTikTokenCounter;

impl CoreTikTokenCounter {
    pub fn new() -> Self {
        CoreTikTokenCounter
    }

    fn bpe() -> Option<&'static CoreBPE> {
        static BPE: OnceLock<Option<CoreBPE>> = OnceLock::new();
        BPE.get_or_init(|| match cl100k_base() {
            Ok(bpe) => Some(bpe),
            Err(e) => {
                error!("TikTokenCounter: Failed to initialize cl100k_base BPE: {e:?}");
                None
            }
        })
        .as_ref()
    }
}

impl Default for CoreTikTokenCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCounterOperations for CoreTikTokenCounter {
    fn count_tokens(&self, text: &str) -> Result<usize, TokenizerError> {
        match Self::bpe() {
            Some(bpe) => Ok(bpe.encode_with_special_tokens(text).len()),
            None => Err(TokenizerError::Unavailable(
                "cl100k_base could not be loaded".to_string(),
            )),
        }
    }
}

/*
 * The one fallback formula: ceil(word_count * 1.3), where words are the non-empty
 * runs between whitespace. Empty or whitespace-only text yields zero.
 */
pub fn fallback_token_estimate(text: &str) -> usize {
    let words = text.split_whitespace().count();
    (words as f64 * FALLBACK_TOKENS_PER_WORD).ceil() as usize
}

#[derive(Debug, Clone, Copy)]
struct EpochTaggedCount {
    epoch: u64,
    token_count: usize,
}

/*
 * Session-scoped token accounting. Never fails: any tokenizer error degrades to
 * the fallback estimator and flips the approximate flag, which the view layer
 * surfaces next to every total.
 */
pub struct TokenAccountant {
    tokenizer: Option<Arc<dyn TokenCounterOperations>>,
    tokenizer_healthy: bool,
    epoch: u64,
    base_counts: HashMap<String, usize>,
    rendered_counts: HashMap<String, EpochTaggedCount>,
}

impl TokenAccountant {
    pub fn new(tokenizer: Option<Arc<dyn TokenCounterOperations>>) -> Self {
        if tokenizer.is_none() {
            log::info!("TokenAccountant: No tokenizer configured, using the fallback estimator.");
        }
        TokenAccountant {
            tokenizer,
            tokenizer_healthy: true,
            epoch: 0,
            base_counts: HashMap::new(),
            rendered_counts: HashMap::new(),
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /* Marks every rendered count as stale. Called on each selection change. */
    pub fn bump_epoch(&mut self) {
        self.epoch += 1;
        log::trace!("TokenAccountant: Epoch advanced to {}", self.epoch);
    }

    pub fn is_approximate(&self) -> bool {
        self.tokenizer.is_none() || !self.tokenizer_healthy
    }

    /*
     * Estimates the token count of arbitrary text. Tries the tokenizer first and
     * falls back on error. A change in tokenizer health advances the epoch, since
     * every rendered count computed under the other regime is now inconsistent.
     */
    pub fn estimate(&mut self, text: &str) -> usize {
        let Some(tokenizer) = self.tokenizer.as_ref() else {
            return fallback_token_estimate(text);
        };

        match tokenizer.count_tokens(text) {
            Ok(count) => {
                if !self.tokenizer_healthy {
                    log::info!("TokenAccountant: Tokenizer recovered, leaving approximate mode.");
                    self.tokenizer_healthy = true;
                    self.bump_epoch();
                }
                count
            }
            Err(e) => {
                if self.tokenizer_healthy {
                    warn!("TokenAccountant: {e}. Falling back to word-based estimation.");
                    self.tokenizer_healthy = false;
                    self.bump_epoch();
                }
                fallback_token_estimate(text)
            }
        }
    }

    /*
     * Token count of the file's content alone. Only tokenizer counts are memoized
     * (by content checksum); while approximate, the fallback is returned directly
     * so a tree never mixes counts from the two regimes.
     */
    pub fn base_token_count(&mut self, file: &RepoFile) -> usize {
        if file.is_binary {
            return 0;
        }
        if self.is_approximate() {
            return fallback_token_estimate(&file.content);
        }
        if let Some(count) = self.base_counts.get(file.checksum()) {
            return *count;
        }
        let count = self.estimate(&file.content);
        if !self.is_approximate() {
            self.base_counts.insert(file.checksum().to_string(), count);
        }
        count
    }

    /*
     * Token count of the file's full rendered block. `render` is only invoked on a
     * cache miss, i.e. when no count exists for this path in the current epoch.
     */
    pub fn rendered_token_count<F>(&mut self, file: &RepoFile, render: F) -> usize
    where
        F: FnOnce() -> String,
    {
        if file.is_binary {
            return 0;
        }
        if let Some(cached) = self.rendered_counts.get(&file.path) {
            if cached.epoch == self.epoch {
                return cached.token_count;
            }
        }
        let text = render();
        let token_count = self.estimate(&text);
        // `estimate` may itself have advanced the epoch; tag with the one now current.
        self.rendered_counts.insert(
            file.path.clone(),
            EpochTaggedCount {
                epoch: self.epoch,
                token_count,
            },
        );
        token_count
    }

    #[cfg(test)]
    pub(crate) fn cached_base_count_len(&self) -> usize {
        self.base_counts.len()
    }
}
