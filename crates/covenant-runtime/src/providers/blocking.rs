//! Adapter from synchronous enrichment to the async seam.

use async_trait::async_trait;
use covenant_core::{
    Clause, CounterPartyArgument, EditSuggestion, EnrichmentError, EnrichmentProvider,
    LegalReference,
};

use super::AsyncEnrichmentProvider;

/// Runs a synchronous [`EnrichmentProvider`] inline on the calling task.
///
/// Only suitable for providers that return quickly, such as
/// [`covenant_core::DefaultEnrichment`].
#[derive(Debug, Clone, Default)]
pub struct Blocking<P> {
    inner: P,
}

impl<P: EnrichmentProvider> Blocking<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: EnrichmentProvider> AsyncEnrichmentProvider for Blocking<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn suggest_edits(&self, clause: &Clause) -> Result<Vec<EditSuggestion>, EnrichmentError> {
        self.inner.suggest_edits(clause)
    }

    async fn counterparty_arguments(
        &self,
        clause: &Clause,
    ) -> Result<Vec<CounterPartyArgument>, EnrichmentError> {
        self.inner.counterparty_arguments(clause)
    }

    async fn legal_references(
        &self,
        clause: &Clause,
    ) -> Result<Vec<LegalReference>, EnrichmentError> {
        self.inner.legal_references(clause)
    }
}
