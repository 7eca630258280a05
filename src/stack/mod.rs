//! Service classification
//!
//! Manifest parsing, the framework matcher table, the datastore lexicon and
//! the classifier that ties them together.

pub mod classifier;
pub mod lexicon;
pub mod manifest;
pub mod matcher;
pub mod types;

pub use classifier::{resolve_siblings, sanitize_name, Classification, ServiceClassifier};
pub use lexicon::{LexiconEntry, LEXICON};
pub use manifest::{parse_manifest, ClassificationError, ManifestKind, ParsedManifest, LOCKFILES};
pub use matcher::{find_matcher, DependencyPattern, ServiceMatcher, MATCHERS};
pub use types::{
    Dependency, DatastoreKind, Ecosystem, PackageManager, ResourceKind, RuntimeHints,
    ServiceDescriptor, ServiceKind,
};
