use cucumber::given;

use crate::cucumber::{marketplace_world::SettlementSystem, MarketplaceWorld};

#[given("a fresh marketplace")]
async fn fresh_marketplace(world: &mut MarketplaceWorld) {
    let system = SettlementSystem::new().await;
    world.system = Some(system);
}
