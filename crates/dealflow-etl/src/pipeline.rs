//! Extract → transform → load orchestration

use crate::hubspot::CrmExtractor;
use crate::load::{Loader, Warehouse};
use crate::transform::{transform, Transformed};
use crate::Result;
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub deals_extracted: usize,
    pub contacts_extracted: usize,
    pub deals_loaded: u64,
    pub leads_loaded: u64,
}

/// CRM to warehouse pipeline
pub struct Pipeline<W> {
    extractor: CrmExtractor,
    loader: Loader<W>,
}

impl<W: Warehouse> Pipeline<W> {
    pub fn new(extractor: CrmExtractor, loader: Loader<W>) -> Self {
        Self { extractor, loader }
    }

    /// Run every stage in order.
    ///
    /// Extraction failures abort before anything reaches the warehouse. A
    /// failed table load is reported after both tables were attempted.
    pub async fn run(&self) -> Result<PipelineStats> {
        info!("Starting CRM pipeline");

        let prepared = extract_and_transform(&self.extractor).await?;
        let load = self
            .loader
            .load(&prepared.rows.deals, &prepared.rows.leads)
            .await?;

        let stats = PipelineStats {
            deals_extracted: prepared.deals_extracted,
            contacts_extracted: prepared.contacts_extracted,
            deals_loaded: load.deals_loaded,
            leads_loaded: load.leads_loaded,
        };

        info!(?stats, "CRM pipeline completed");
        Ok(stats)
    }
}

/// Output of the first two stages
#[derive(Debug, Clone, Default)]
pub struct Prepared {
    pub deals_extracted: usize,
    pub contacts_extracted: usize,
    pub rows: Transformed,
}

/// Extract and transform without loading.
pub async fn extract_and_transform(extractor: &CrmExtractor) -> Result<Prepared> {
    let extracted = extractor.fetch().await?;
    let rows = transform(&extracted.deals, &extracted.contacts);

    info!(
        deals = rows.deals.len(),
        leads = rows.leads.len(),
        "Transformed CRM records"
    );

    Ok(Prepared {
        deals_extracted: extracted.deals.len(),
        contacts_extracted: extracted.contacts.len(),
        rows,
    })
}
