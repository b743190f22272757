//! # Knowledge-Store Entities
//!
//! The closed set of records the skill submits. Each entity serializes to a
//! JSON map keyed by the store's namespaced attribute names, with the entity
//! kind carried in `schema/entity-type`.

use crate::batch::LocalRef;
use crate::verification::{CommitVerification, VerificationReason};
use crate::{CommitSha, ProviderUrl, SourceId};
use serde::Serialize;

/// Entity type tag for repositories
pub const REPO_ENTITY_TYPE: &str = "git/repo";

/// Entity type tag for commits
pub const COMMIT_ENTITY_TYPE: &str = "git/commit";

/// Entity type tag for commit signatures
pub const COMMIT_SIGNATURE_ENTITY_TYPE: &str = "git.commit/signature";

// ============================================================================
// Entity union
// ============================================================================

/// Any entity the sink accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "schema/entity-type")]
pub enum Entity {
    #[serde(rename = "git/repo")]
    Repo(GitRepoEntity),

    #[serde(rename = "git/commit")]
    Commit(GitCommitEntity),

    #[serde(rename = "git.commit/signature")]
    CommitSignature(GitCommitSignatureEntity),
}

impl Entity {
    /// Value written to `schema/entity-type`
    pub fn entity_type(&self) -> &'static str {
        match self {
            Self::Repo(_) => REPO_ENTITY_TYPE,
            Self::Commit(_) => COMMIT_ENTITY_TYPE,
            Self::CommitSignature(_) => COMMIT_SIGNATURE_ENTITY_TYPE,
        }
    }

    /// Local reference this entity declares, if any
    pub fn declares(&self) -> Option<&LocalRef> {
        match self {
            Self::Repo(repo) => Some(&repo.entity),
            Self::Commit(commit) => Some(&commit.entity),
            Self::CommitSignature(_) => None,
        }
    }

    /// Local references this entity points at
    pub fn references(&self) -> Vec<&LocalRef> {
        match self {
            Self::Repo(_) => Vec::new(),
            Self::Commit(commit) => vec![&commit.repo],
            Self::CommitSignature(signature) => vec![&signature.commit],
        }
    }
}

impl From<GitRepoEntity> for Entity {
    fn from(entity: GitRepoEntity) -> Self {
        Self::Repo(entity)
    }
}

impl From<GitCommitEntity> for Entity {
    fn from(entity: GitCommitEntity) -> Self {
        Self::Commit(entity)
    }
}

impl From<GitCommitSignatureEntity> for Entity {
    fn from(entity: GitCommitSignatureEntity) -> Self {
        Self::CommitSignature(entity)
    }
}

// ============================================================================
// Entity kinds
// ============================================================================

/// A source repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitRepoEntity {
    #[serde(rename = "schema/entity")]
    pub entity: LocalRef,

    #[serde(rename = "git.repo/source-id")]
    pub source_id: SourceId,

    #[serde(rename = "git.provider/url")]
    pub url: ProviderUrl,
}

/// A single commit, linked to its repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitCommitEntity {
    #[serde(rename = "schema/entity")]
    pub entity: LocalRef,

    #[serde(rename = "git.commit/repo")]
    pub repo: LocalRef,

    #[serde(rename = "git.commit/sha")]
    pub sha: CommitSha,

    #[serde(rename = "git.provider/url")]
    pub url: ProviderUrl,
}

/// Whether the provider considered the signature verified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignatureStatus {
    Verified,
    NotVerified,
}

impl SignatureStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::NotVerified => "not-verified",
        }
    }
}

/// Signature verification result, linked to its commit.
///
/// `signature` is empty exactly when the commit carried no signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitCommitSignatureEntity {
    #[serde(rename = "git.commit.signature/commit")]
    pub commit: LocalRef,

    #[serde(rename = "git.commit.signature/signature")]
    pub signature: String,

    #[serde(rename = "git.commit.signature/status")]
    pub status: SignatureStatus,

    #[serde(rename = "git.commit.signature/reason")]
    pub reason: VerificationReason,
}

impl GitCommitSignatureEntity {
    /// Build the entity for `commit` from a normalized verification
    pub fn from_verification(commit: LocalRef, verification: &CommitVerification) -> Self {
        let status = if verification.verified {
            SignatureStatus::Verified
        } else {
            SignatureStatus::NotVerified
        };

        Self {
            commit,
            signature: verification.signature.clone().unwrap_or_default(),
            status,
            reason: verification.reason,
        }
    }
}

#[cfg(test)]
#[path = "entities_tests.rs"]
mod tests;
