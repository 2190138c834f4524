//! Resource adapters, one per managed object type.

mod bucket;
mod bucket_cors;
mod bucket_lifecycle;
mod bucket_policy;
mod object;

pub use bucket::{BucketModel, BucketResource};
pub use bucket_cors::{BucketCorsConfigurationResource, CorsConfigurationModel, CorsRuleModel};
pub use bucket_lifecycle::{
    BucketLifecycleConfigurationResource, ExpirationModel, LifecycleAndModel,
    LifecycleConfigurationModel, LifecycleFilterModel, LifecycleRuleModel,
    NoncurrentExpirationModel,
};
pub use bucket_policy::{BucketPolicyModel, BucketPolicyResource, POLICY_REPLACE_DESCRIPTION};
pub use object::{ObjectModel, ObjectResource};
