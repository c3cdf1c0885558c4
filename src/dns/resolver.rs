//! Cache-first resolution with store fallback.
//!
//! ```text
//! Validate -> CacheLookup -> Respond(cache)
//!                         -> StoreLookup -> Respond(store) | Fail(SERVFAIL) | Fail(NXDOMAIN)
//! ```

use crate::cache::RecordCache;
use crate::dns::answer::synthesize;
use crate::dns::promotion::{AnswerSource, PromotionOutcome, Promoter};
use crate::record::{Question, WILDCARD_QTYPE};
use crate::store::DynRecordStore;
use tokio::task::JoinHandle;
use tracing::{debug, error};
use trust_dns_server::client::op::ResponseCode;
use trust_dns_server::client::rr::Record;

/// The terminal state of one resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A successful response, possibly with zero answers.
    Answered {
        question: Question,
        answers: Vec<Record>,
        source: AnswerSource,
    },
    /// A response carrying only an error code.
    Failed(ResponseCode),
}

impl Resolution {
    pub fn response_code(&self) -> ResponseCode {
        match self {
            Resolution::Answered { .. } => ResponseCode::NoError,
            Resolution::Failed(code) => *code,
        }
    }

    pub fn source(&self) -> Option<AnswerSource> {
        match self {
            Resolution::Answered { source, .. } => Some(*source),
            Resolution::Failed(_) => None,
        }
    }

    pub fn answers(&self) -> &[Record] {
        match self {
            Resolution::Answered { answers, .. } => answers,
            Resolution::Failed(_) => &[],
        }
    }
}

#[derive(Clone)]
pub struct Resolver {
    store: DynRecordStore,
    cache: RecordCache,
    promoter: Promoter,
}

impl Resolver {
    pub fn new(store: DynRecordStore, cache: RecordCache, promoter: Promoter) -> Self {
        Self {
            store,
            cache,
            promoter,
        }
    }

    pub fn promoter(&self) -> &Promoter {
        &self.promoter
    }

    /// Resolve `question`; `None` stands for a query without a question section.
    ///
    /// Answers served from the cache never touch the store. On a miss every record of the
    /// domain is read and filtered down to the requested type: a store failure is `SERVFAIL`,
    /// a domain without any rows is `NXDOMAIN`, and rows that yield no answers for the
    /// requested type still make a successful, empty response.
    pub async fn resolve(&self, question: Option<Question>) -> Resolution {
        let Some(question) = question else {
            return Resolution::Failed(ResponseCode::FormErr);
        };
        let qtype = question.qtype();

        if let Some(records) = self.cache.get_records(&question.domain, &qtype).await {
            debug!("cache hit: {question}");
            return Resolution::Answered {
                answers: synthesize(&records, question.query_type),
                question,
                source: AnswerSource::Cache,
            };
        }

        let records = match self.store.lookup(&question.domain, WILDCARD_QTYPE).await {
            Ok(records) => records,
            Err(err) => {
                error!("store lookup failed for {question}: {err}");
                return Resolution::Failed(ResponseCode::ServFail);
            }
        };
        if records.is_empty() {
            debug!("no records for {question}");
            return Resolution::Failed(ResponseCode::NXDomain);
        }

        debug!("serving {question} from store");
        Resolution::Answered {
            answers: synthesize(&records, question.query_type),
            question,
            source: AnswerSource::Store,
        }
    }

    /// Schedule the promotion policy for an answered resolution. Failures schedule nothing.
    pub fn promote(&self, resolution: &Resolution) -> Option<JoinHandle<PromotionOutcome>> {
        match resolution {
            Resolution::Answered {
                question, source, ..
            } => self.promoter.schedule(question.clone(), *source),
            Resolution::Failed(_) => None,
        }
    }
}
