pub mod aggregate;
pub mod classify;
pub mod extract;
pub mod normalize;
pub mod sections;
pub mod tables;

use crate::db::DocumentRow;
use crate::fallback::Fallback;
use aggregate::Collected;
use classify::CategoryRegistry;

/// Stored fetch attempt → tagged extraction result. A failed fetch goes
/// straight to the fallback data.
pub fn process_document(
    doc: &DocumentRow,
    registry: &CategoryRegistry,
    fallback: &Fallback,
) -> Collected {
    aggregate::collect(doc.document(), &doc.ticker, registry, fallback)
}
