use once_cell::sync::Lazy;
use regex::Regex;

/// Everything the chain encodes into free-text transfer memos, as one
/// priority-ordered rule table. Order matters: the first matching rule wins,
/// and `Transfer` handlers consult companion events before any memo rule.
static REWARD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^reward for ([0-9]+)$").unwrap());
static CLAIM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^claimed points").unwrap());
static REFERRAL_REGISTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^referral registration bonus from: ([a-z0-9.-]+)$").unwrap());
static REFERRAL_PURCHASE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^referral purchase bonus \(([0-9]+(?:\.[0-9]+)?)%\) from: ([a-z0-9.-]+)$").unwrap()
});
static DONATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^donation for ([^:\s]+):([^:\s]+):([^\s]+)$").unwrap());
static RESTOCK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^restock: ([A-Z0-9]+)$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MemoKind {
    Reward {
        tracery: String,
    },
    Claim,
    /// Only honored when the sender is the bounty account.
    ReferralRegisterBonus {
        initiator: String,
    },
    /// Only honored when the sender is the bounty account.
    ReferralPurchaseBonus {
        initiator: String,
        percent: String,
    },
    Donation {
        community_id: String,
        user_id: String,
        permlink: String,
    },
    Restock {
        symbol: String,
    },
}

pub(crate) fn classify_memo(memo: &str) -> Option<MemoKind> {
    if let Some(captures) = REWARD_RE.captures(memo) {
        return Some(MemoKind::Reward {
            tracery: captures[1].to_string(),
        });
    }
    if CLAIM_RE.is_match(memo) {
        return Some(MemoKind::Claim);
    }
    if let Some(captures) = REFERRAL_REGISTER_RE.captures(memo) {
        return Some(MemoKind::ReferralRegisterBonus {
            initiator: captures[1].to_string(),
        });
    }
    if let Some(captures) = REFERRAL_PURCHASE_RE.captures(memo) {
        return Some(MemoKind::ReferralPurchaseBonus {
            percent: captures[1].to_string(),
            initiator: captures[2].to_string(),
        });
    }
    if let Some(captures) = DONATION_RE.captures(memo) {
        return Some(MemoKind::Donation {
            community_id: captures[1].to_string(),
            user_id: captures[2].to_string(),
            permlink: captures[3].to_string(),
        });
    }
    if let Some(captures) = RESTOCK_RE.captures(memo) {
        return Some(MemoKind::Restock {
            symbol: captures[1].to_string(),
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reward_memo() {
        assert_eq!(
            classify_memo("reward for 4039900225"),
            Some(MemoKind::Reward {
                tracery: "4039900225".to_string()
            })
        );
        assert_eq!(classify_memo("reward for nothing"), None);
    }

    #[test]
    fn test_claim_memo() {
        assert_eq!(classify_memo("claimed points"), Some(MemoKind::Claim));
        assert_eq!(
            classify_memo("claimed points from gems"),
            Some(MemoKind::Claim)
        );
    }

    #[test]
    fn test_referral_memos() {
        assert_eq!(
            classify_memo("referral registration bonus from: tst1aboaetm"),
            Some(MemoKind::ReferralRegisterBonus {
                initiator: "tst1aboaetm".to_string()
            })
        );
        assert_eq!(
            classify_memo("referral purchase bonus (5%) from: tst1aboaetm"),
            Some(MemoKind::ReferralPurchaseBonus {
                percent: "5".to_string(),
                initiator: "tst1aboaetm".to_string()
            })
        );
        assert_eq!(
            classify_memo("referral purchase bonus (2.5%) from: alice"),
            Some(MemoKind::ReferralPurchaseBonus {
                percent: "2.5".to_string(),
                initiator: "alice".to_string()
            })
        );
    }

    #[test]
    fn test_donation_memo() {
        assert_eq!(
            classify_memo("donation for CATS:alice:my-first-post"),
            Some(MemoKind::Donation {
                community_id: "CATS".to_string(),
                user_id: "alice".to_string(),
                permlink: "my-first-post".to_string()
            })
        );
        assert_eq!(classify_memo("donation for CATS:alice"), None);
    }

    #[test]
    fn test_restock_memo() {
        assert_eq!(
            classify_memo("restock: CATS"),
            Some(MemoKind::Restock {
                symbol: "CATS".to_string()
            })
        );
        assert_eq!(classify_memo("restock CATS"), None);
    }

    #[test]
    fn test_plain_memo() {
        assert_eq!(classify_memo(""), None);
        assert_eq!(classify_memo("thanks for lunch"), None);
    }

    #[test]
    fn test_reward_has_priority_over_donation_shape() {
        // A reward memo can never be shadowed by a later rule.
        assert!(matches!(
            classify_memo("reward for 123"),
            Some(MemoKind::Reward { .. })
        ));
    }
}
