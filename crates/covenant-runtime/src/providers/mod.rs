//! Async enrichment providers.
//!
//! Enrichment sources that do I/O (a lookup service, a model endpoint)
//! implement [`AsyncEnrichmentProvider`]. Synchronous providers from
//! `covenant-core` are lifted with [`Blocking`].

mod blocking;

use std::sync::Arc;

use async_trait::async_trait;
use covenant_core::{Clause, CounterPartyArgument, EditSuggestion, EnrichmentError, LegalReference};

pub use blocking::Blocking;

/// Source of suggestions, arguments and references for one clause.
///
/// The three generators are independent and may run concurrently for the
/// same clause. Implementations must not assume any ordering between them.
#[async_trait]
pub trait AsyncEnrichmentProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn suggest_edits(&self, clause: &Clause) -> Result<Vec<EditSuggestion>, EnrichmentError>;

    async fn counterparty_arguments(
        &self,
        clause: &Clause,
    ) -> Result<Vec<CounterPartyArgument>, EnrichmentError>;

    async fn legal_references(&self, clause: &Clause)
        -> Result<Vec<LegalReference>, EnrichmentError>;
}

#[async_trait]
impl<P: AsyncEnrichmentProvider + ?Sized> AsyncEnrichmentProvider for Arc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn suggest_edits(&self, clause: &Clause) -> Result<Vec<EditSuggestion>, EnrichmentError> {
        (**self).suggest_edits(clause).await
    }

    async fn counterparty_arguments(
        &self,
        clause: &Clause,
    ) -> Result<Vec<CounterPartyArgument>, EnrichmentError> {
        (**self).counterparty_arguments(clause).await
    }

    async fn legal_references(
        &self,
        clause: &Clause,
    ) -> Result<Vec<LegalReference>, EnrichmentError> {
        (**self).legal_references(clause).await
    }
}
