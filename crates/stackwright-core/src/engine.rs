//! The infrastructure engine seam.

use std::collections::BTreeMap;

use stackwright_common::error::Result;
use stackwright_common::types::Urn;

use crate::input::{Input, OutputRef};
use crate::resource::ResourceDeclaration;

/// Black-box engine that realizes declarations.
///
/// Implementors accept each declaration in order and resolve its outputs
/// whenever the underlying infrastructure is known. Nothing in the
/// composition layer waits on them.
pub trait ResourceEngine: Send {
    /// Accepts a resource or component declaration.
    ///
    /// `outputs` holds one unresolved cell per output property of the kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects the declaration.
    fn register_resource(
        &mut self,
        declaration: &ResourceDeclaration,
        outputs: &BTreeMap<String, OutputRef>,
    ) -> Result<()>;

    /// Records the outputs a component publishes.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects the outputs.
    fn register_outputs(&mut self, component: &Urn, outputs: &BTreeMap<String, Input>)
    -> Result<()>;

    /// Records a stack-level export.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects the export.
    fn export(&mut self, name: &str, value: &Input) -> Result<()>;
}
