mod deadline;
mod failures;
mod ordering;
mod pipeline;
mod reuse;
mod support;
