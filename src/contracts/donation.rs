//! Donation entry points
//!
//! First-time donors call `donate_first_time`, which creates their profile.
//! Repeat donors pass their existing profile to `donate_repeat`.

use crate::config::NetworkConfig;
use crate::error::{Error, Result};
use crate::ptb::{Argument, PtbBuilder};
use crate::types::{DonationFlow, ObjectRef, SharedObjectRef, TypeTag};

pub const DONATIONS_MODULE: &str = "donations";

pub const DONATE_FIRST_TIME: &str = "donate_first_time";

pub const DONATE_REPEAT: &str = "donate_repeat";

/// Objects referenced by a donation call
#[derive(Debug, Clone, Copy)]
pub struct DonationObjects {
    pub campaign: SharedObjectRef,
    pub stats: SharedObjectRef,
    pub token_registry: SharedObjectRef,
    pub clock: SharedObjectRef,
    /// Donor profile, repeat flow only
    pub profile: Option<ObjectRef>,
}

/// Values passed to the donation call
#[derive(Debug, Clone)]
pub struct DonationCall {
    pub flow: DonationFlow,
    pub coin_type: TypeTag,
    pub coin: Argument,
    pub price_info: Argument,
    pub expected_min_usd_micro: u64,
    pub max_age_override_secs: Option<u64>,
}

pub fn function_name(flow: DonationFlow) -> &'static str {
    match flow {
        DonationFlow::FirstTime => DONATE_FIRST_TIME,
        DonationFlow::Repeat => DONATE_REPEAT,
    }
}

/// Append the donation call.
///
/// Argument layout:
/// `(campaign, stats, registry, [profile,] price_info, coin, expected_min_usd_micro, max_age_override, clock)`
pub fn donate(
    ptb: &mut PtbBuilder,
    config: &NetworkConfig,
    objects: &DonationObjects,
    call: DonationCall,
) -> Result<Argument> {
    let campaign = ptb.object(objects.campaign)?;
    let stats = ptb.object(objects.stats)?;
    let registry = ptb.object(objects.token_registry.immutable())?;

    let mut arguments = vec![campaign, stats, registry];
    if call.flow == DonationFlow::Repeat {
        let profile = objects
            .profile
            .ok_or_else(|| Error::validation("profile_id", "required for repeat donations"))?;
        arguments.push(ptb.object(profile)?);
    }

    let expected_min = ptb.pure(&call.expected_min_usd_micro)?;
    let max_age = ptb.pure(&call.max_age_override_secs)?;
    let clock = ptb.object(objects.clock.immutable())?;
    arguments.extend([call.price_info, call.coin, expected_min, max_age, clock]);

    let target = config.crowdfund_target(DONATIONS_MODULE, function_name(call.flow));
    Ok(ptb.move_call(&target, vec![call.coin_type], arguments))
}
