//! Deterministic identifiers for planned resources.
//!
//! Every synthesized value is a pure function of the declaration, region,
//! and account, so planning the same inputs twice yields identical output.

use serde_json::Value;
use sha2::{Digest, Sha256};
use stackwright_core::{Input, ResourceDeclaration, ResourceKind};

/// Hex digest of `seed`, truncated to `len` characters.
#[must_use]
pub fn short_hash(seed: &str, len: usize) -> String {
    let digest = Sha256::digest(seed.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest.iter() {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex.truncate(len);
    hex
}

/// Decimal digits derived from `seed`, `len` characters long.
fn digits(seed: &str, len: usize) -> String {
    short_hash(seed, len)
        .chars()
        .map(|c| c.to_digit(16).map_or('0', |d| char::from(b'0' + (d % 10) as u8)))
        .collect()
}

fn literal(input: Option<&Input>) -> Option<String> {
    match input.map(Input::to_json) {
        Some(Value::String(s)) if !s.contains("${") => Some(s),
        _ => None,
    }
}

/// The name the cloud would give this resource.
///
/// Uses the declared `name`, `bucket`, or `family` property when it is
/// known, otherwise the logical name plus a short hash of the URN.
#[must_use]
pub fn physical_name(declaration: &ResourceDeclaration) -> String {
    let explicit = match declaration.kind {
        ResourceKind::Bucket => literal(declaration.property("bucket")),
        ResourceKind::TaskDefinition => literal(declaration.property("family")),
        _ => literal(declaration.property("name")),
    };
    explicit.unwrap_or_else(|| {
        format!(
            "{}-{}",
            declaration.name,
            short_hash(declaration.urn.as_str(), 7)
        )
    })
}

/// Synthesizes the value of one output property.
#[must_use]
pub fn synthesize(
    declaration: &ResourceDeclaration,
    property: &str,
    region: &str,
    account: &str,
) -> Value {
    let name = physical_name(declaration);
    let seed = declaration.urn.as_str();
    let hash = short_hash(seed, 16);

    let value = match (&declaration.kind, property) {
        (_, "name" | "bucket") => name,
        (ResourceKind::Cluster, "arn") => format!("arn:aws:ecs:{region}:{account}:cluster/{name}"),
        (ResourceKind::TaskDefinition, "arn") => {
            format!("arn:aws:ecs:{region}:{account}:task-definition/{name}:1")
        }
        (ResourceKind::TaskDefinition, "family") => name,
        (ResourceKind::TaskDefinition, "revision") => return Value::from(1),
        (ResourceKind::Service, "id") => format!("arn:aws:ecs:{region}:{account}:service/{name}"),
        (ResourceKind::LoadBalancer, "arn") => {
            format!(
                "arn:aws:elasticloadbalancing:{region}:{account}:loadbalancer/app/{name}/{hash}"
            )
        }
        (ResourceKind::LoadBalancer, "dnsName") => {
            format!("{name}-{}.{region}.elb.amazonaws.com", digits(seed, 10))
        }
        (ResourceKind::LoadBalancer, "zoneId") => {
            format!("Z{}", short_hash(seed, 13).to_uppercase())
        }
        (ResourceKind::TargetGroup, "arn") => {
            format!("arn:aws:elasticloadbalancing:{region}:{account}:targetgroup/{name}/{hash}")
        }
        (ResourceKind::Listener, "arn") => {
            format!("arn:aws:elasticloadbalancing:{region}:{account}:listener/app/{name}/{hash}")
        }
        (ResourceKind::ScalingTarget, "resourceId") => {
            return declaration
                .property("resourceId")
                .map_or(Value::Null, Input::to_json);
        }
        (ResourceKind::ScalingPolicy, "arn") => format!(
            "arn:aws:autoscaling:{region}:{account}:scalingPolicy:{hash}:policyName/{name}"
        ),
        (ResourceKind::Bucket, "arn") => format!("arn:aws:s3:::{name}"),
        (ResourceKind::Bucket, "websiteEndpoint") => {
            format!("{name}.s3-website-{region}.amazonaws.com")
        }
        (ResourceKind::Bucket, "bucketRegionalDomainName") => {
            format!("{name}.s3.{region}.amazonaws.com")
        }
        (ResourceKind::BucketPolicy, "id") => {
            return declaration
                .property("bucket")
                .map_or(Value::Null, Input::to_json);
        }
        (ResourceKind::Distribution, "id") => distribution_id(seed),
        (ResourceKind::Distribution, "arn") => format!(
            "arn:aws:cloudfront::{account}:distribution/{}",
            distribution_id(seed)
        ),
        (ResourceKind::Distribution, "domainName") => {
            format!("d{}.cloudfront.net", short_hash(seed, 13))
        }
        (ResourceKind::BuildProject, "arn") => {
            format!("arn:aws:codebuild:{region}:{account}:project/{name}")
        }
        (ResourceKind::Pipeline, "arn") => {
            format!("arn:aws:codepipeline:{region}:{account}:{name}")
        }
        (ResourceKind::NotificationRule, "arn") => format!(
            "arn:aws:codestar-notifications:{region}:{account}:notificationrule/{hash}"
        ),
        (kind, other) => format!("{}:{other}:{hash}", kind.token()),
    };
    Value::String(value)
}

fn distribution_id(seed: &str) -> String {
    format!("E{}", short_hash(seed, 13).to_uppercase())
}
