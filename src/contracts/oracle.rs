//! Price oracle update call

use crate::config::OracleConfig;
use crate::error::Result;
use crate::oracle::OracleObjects;
use crate::ptb::{Argument, PtbBuilder};

/// Verify `update_data` on chain and refresh the price object.
///
/// `update_price(pyth_state, wormhole_state, price_info, update_data, fee, clock)`;
/// the fee coin is split from the gas coin. Returns the price object argument.
pub fn update_price(
    ptb: &mut PtbBuilder,
    config: &OracleConfig,
    objects: &OracleObjects,
    update_data: &[u8],
) -> Result<Argument> {
    let fee_amount = ptb.pure(&config.update_fee)?;
    let fee = ptb.split_coins(Argument::GasCoin, vec![fee_amount])[0];

    let pyth_state = ptb.object(objects.pyth_state.immutable())?;
    let wormhole_state = ptb.object(objects.wormhole_state.immutable())?;
    let price_info = ptb.object(objects.price_info)?;
    let data = ptb.pure(update_data)?;
    let clock = ptb.object(objects.clock.immutable())?;

    ptb.move_call(
        &config.update_target,
        vec![],
        vec![pyth_state, wormhole_state, price_info, data, fee, clock],
    );

    Ok(price_info)
}
