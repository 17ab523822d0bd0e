// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// Workflow coordination only: each use case calls the data,
// ml and infra layers in order and returns a summary for the
// CLI to print. No tensor code and no argument parsing here.

/// Train the name classifier, then predict from a saved run
pub mod names_use_case;

/// Train the translator, then translate from a saved run
pub mod translate_use_case;
