use tollgate_domain::{
    BundleDefinition, QualifierEvaluation, add_duration, evaluate_qualifiers, expiry_has_passed,
};
use tracing::info;

use super::*;

impl EntitlementService {
    /// Resolves a grant request for the calling subject.
    ///
    /// Policy and qualifier rejections are returned as decisions; only
    /// validation and store failures are errors.
    pub async fn request_bundle(
        &self,
        identity: &SubjectIdentity,
        request: BundleRequest,
    ) -> AppResult<GrantDecision> {
        let subject = ensure_subject(identity)?;
        let bundle_id = validated_bundle_id(request.bundle_id.as_str())?;
        let catalog = self.catalog().await;
        let now = self.clock.now();

        let decision = match catalog.bundle(bundle_id.as_str()) {
            Some(definition) => {
                self.request_catalog_bundle(identity, definition, request.qualifiers, now)
                    .await?
            }
            None => self.request_legacy_bundle(subject, bundle_id.clone(), now).await?,
        };

        info!(
            subject,
            bundle_id = %bundle_id,
            decision = decision.as_str(),
            "bundle request resolved"
        );

        Ok(decision)
    }

    async fn request_catalog_bundle(
        &self,
        identity: &SubjectIdentity,
        definition: &BundleDefinition,
        qualifiers: BTreeMap<String, Value>,
        now: DateTime<Utc>,
    ) -> AppResult<GrantDecision> {
        let bundle_id = definition.id();

        if definition.is_automatic() {
            return Ok(GrantDecision::Granted {
                bundle_id: bundle_id.clone(),
                expiry: None,
            });
        }

        let existing = self.catalog_grants.list_grants(identity.subject()).await?;
        if let Some(held) = active_grant(&existing, bundle_id.as_str(), now) {
            return Ok(GrantDecision::AlreadyGranted {
                bundle_id: bundle_id.clone(),
                expiry: held.expiry(),
            });
        }

        match evaluate_qualifiers(definition, identity.claims(), &qualifiers) {
            QualifierEvaluation::Satisfied => {}
            QualifierEvaluation::Mismatch(reason) => {
                return Ok(GrantDecision::QualifierMismatch(reason));
            }
            QualifierEvaluation::Unknown(key) => return Ok(GrantDecision::UnknownQualifier(key)),
        }

        if let Some(cap) = definition.cap() {
            let holders = self.catalog_grants.count_holders(bundle_id, now).await?;
            if holders >= u64::from(cap) {
                return Ok(GrantDecision::CapReached);
            }
        }

        let expiry = definition
            .timeout()
            .map(|timeout| add_duration(now, timeout).date_naive());
        let grant = BundleGrant::new(bundle_id.clone(), expiry)
            .with_qualifiers(qualifiers)
            .with_granted_at(now);

        self.catalog_grants
            .put_grants(identity.subject(), merged_grants(existing, grant))
            .await?;

        Ok(GrantDecision::Granted {
            bundle_id: bundle_id.clone(),
            expiry,
        })
    }

    async fn request_legacy_bundle(
        &self,
        subject: &str,
        bundle_id: BundleId,
        now: DateTime<Utc>,
    ) -> AppResult<GrantDecision> {
        let existing = self.legacy_grants.list_grants(subject).await?;
        if let Some(held) = active_grant(&existing, bundle_id.as_str(), now) {
            return Ok(GrantDecision::AlreadyGranted {
                expiry: held.expiry(),
                bundle_id,
            });
        }

        let policy = self.legacy_policies.policy_for(bundle_id.as_str());
        if policy
            .expiry_date
            .is_some_and(|expiry| expiry_has_passed(expiry, now))
        {
            return Ok(GrantDecision::Expired);
        }

        let holders = self.legacy_grants.count_holders(&bundle_id, now).await?;
        if holders >= u64::from(policy.user_limit) {
            return Ok(GrantDecision::LimitReached);
        }

        let grant = BundleGrant::new(bundle_id.clone(), policy.expiry_date);
        self.legacy_grants
            .put_grants(subject, merged_grants(existing, grant))
            .await?;

        Ok(GrantDecision::Granted {
            bundle_id,
            expiry: policy.expiry_date,
        })
    }
}
