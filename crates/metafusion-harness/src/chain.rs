//! The marketplace contract as seen by the harness.
//!
//! [`PresidentApi`] is the seam the driver talks to. [`LocalChain`] implements
//! it against the marketplace contract deployed in a Soroban sandbox, paid for
//! with a Stellar asset contract token. Every refused call surfaces as
//! [`HarnessError::Rejected`] carrying the contract error.

use std::fmt::Debug;

use metafusion_president::{MetaFusionPresident, MetaFusionPresidentClient};
use soroban_sdk::testutils::{Address as _, EnvTestConfig};
use soroban_sdk::{Address, BytesN, Env, token};
use tracing::trace;

use crate::codec::ImageId;
use crate::error::{HarnessError, HarnessResult, Rejection};
use crate::inventory::Item;

/// Operations of the marketplace contract, in harness terms.
pub trait PresidentApi {
    /// Account that deployed the contract and may forge collections.
    fn owner(&self) -> Address;

    /// Creates a fresh account holding `funding` stroops of the payment token.
    fn create_user(&self, funding: i128) -> HarnessResult<Address>;

    fn forge_collection(&self, caller: &Address, collection: u32) -> HarnessResult<()>;

    fn collection_exists(&self, collection: u32) -> HarnessResult<bool>;

    /// Returns the id of the new packet.
    fn forge_packet(&self, blacksmith: &Address, collection: u32, payment: i128) -> HarnessResult<u32>;

    /// Returns the prompts minted from the packet.
    fn open_packet(&self, opener: &Address, packet_id: u32, payment: i128) -> HarnessResult<Vec<u32>>;

    fn list(&self, seller: &Address, item: &Item, price: i128) -> HarnessResult<()>;

    fn buy(&self, buyer: &Address, item: &Item, payment: i128) -> HarnessResult<()>;

    /// `prompts` is indexed by type slot.
    fn create_image(&self, creator: &Address, prompts: &[u32], payment: i128) -> HarnessResult<ImageId>;

    /// Returns the prompts handed back to the owner.
    fn burn_image(&self, owner: &Address, image: &ImageId) -> HarnessResult<Vec<u32>>;

    fn owner_of(&self, item: &Item) -> HarnessResult<Address>;

    fn packets_of(&self, user: &Address) -> HarnessResult<Vec<u32>>;

    fn prompts_of(&self, user: &Address) -> HarnessResult<Vec<u32>>;

    fn cards_of(&self, user: &Address) -> HarnessResult<Vec<ImageId>>;

    /// Payment token balance, in stroops.
    fn balance(&self, user: &Address) -> HarnessResult<i128>;
}

/// Marketplace contract running in a local Soroban sandbox.
pub struct LocalChain {
    env: Env,
    owner: Address,
    president: MetaFusionPresidentClient<'static>,
    token: token::Client<'static>,
    minter: token::StellarAssetClient<'static>,
}

impl LocalChain {
    /// Deploys the payment token and the marketplace in a new sandbox.
    pub fn deploy() -> Self {
        let env = Env::new_with_config(EnvTestConfig {
            capture_snapshot_at_drop: false,
            ..Default::default()
        });
        env.mock_all_auths();
        env.cost_estimate().budget().reset_unlimited();

        let owner = Address::generate(&env);
        let asset = env.register_stellar_asset_contract_v2(owner.clone());
        let address = env.register(MetaFusionPresident, (&owner, &asset.address()));

        Self {
            president: MetaFusionPresidentClient::new(&env, &address),
            token: token::Client::new(&env, &asset.address()),
            minter: token::StellarAssetClient::new(&env, &asset.address()),
            owner,
            env,
        }
    }

    fn card(&self, image: &ImageId) -> BytesN<32> {
        BytesN::from_array(&self.env, &image.0)
    }
}

impl PresidentApi for LocalChain {
    fn owner(&self) -> Address {
        self.owner.clone()
    }

    fn create_user(&self, funding: i128) -> HarnessResult<Address> {
        let user = Address::generate(&self.env);
        if funding > 0 {
            settle("mint", self.minter.try_mint(&user, &funding))?;
        }
        trace!(?user, funding, "created user");
        Ok(user)
    }

    fn forge_collection(&self, caller: &Address, collection: u32) -> HarnessResult<()> {
        settle("forge_collection", self.president.try_forge_collection(caller, &collection))
    }

    fn collection_exists(&self, collection: u32) -> HarnessResult<bool> {
        settle(
            "check_collection_existence",
            self.president.try_check_collection_existence(&collection),
        )
    }

    fn forge_packet(&self, blacksmith: &Address, collection: u32, payment: i128) -> HarnessResult<u32> {
        settle(
            "forge_packet",
            self.president.try_forge_packet(blacksmith, &collection, &payment),
        )
    }

    fn open_packet(&self, opener: &Address, packet_id: u32, payment: i128) -> HarnessResult<Vec<u32>> {
        let prompts = settle(
            "open_packet",
            self.president.try_open_packet(opener, &packet_id, &payment),
        )?;
        Ok(prompts.iter().collect())
    }

    fn list(&self, seller: &Address, item: &Item, price: i128) -> HarnessResult<()> {
        match item {
            Item::Packet(id) => settle("list_packet", self.president.try_list_packet(seller, id, &price)),
            Item::Prompt(id) => settle("list_prompt", self.president.try_list_prompt(seller, id, &price)),
            Item::Image(id) => settle(
                "list_card",
                self.president.try_list_card(seller, &self.card(id), &price),
            ),
        }
    }

    fn buy(&self, buyer: &Address, item: &Item, payment: i128) -> HarnessResult<()> {
        match item {
            Item::Packet(id) => settle("buy_packet", self.president.try_buy_packet(buyer, id, &payment)),
            Item::Prompt(id) => settle("buy_prompt", self.president.try_buy_prompt(buyer, id, &payment)),
            Item::Image(id) => settle(
                "buy_card",
                self.president.try_buy_card(buyer, &self.card(id), &payment),
            ),
        }
    }

    fn create_image(&self, creator: &Address, prompts: &[u32], payment: i128) -> HarnessResult<ImageId> {
        let prompts = soroban_sdk::Vec::from_slice(&self.env, prompts);
        let card = settle(
            "create_image",
            self.president.try_create_image(creator, &prompts, &payment),
        )?;
        Ok(ImageId(card.to_array()))
    }

    fn burn_image(&self, owner: &Address, image: &ImageId) -> HarnessResult<Vec<u32>> {
        let prompts = settle(
            "burn_image_and_recover_prompts",
            self.president
                .try_burn_image_and_recover_prompts(owner, &self.card(image)),
        )?;
        Ok(prompts.iter().collect())
    }

    fn owner_of(&self, item: &Item) -> HarnessResult<Address> {
        match item {
            Item::Packet(id) => settle("owner_of_packet", self.president.try_owner_of_packet(id)),
            Item::Prompt(id) => settle("owner_of_prompt", self.president.try_owner_of_prompt(id)),
            Item::Image(id) => settle("owner_of_card", self.president.try_owner_of_card(&self.card(id))),
        }
    }

    fn packets_of(&self, user: &Address) -> HarnessResult<Vec<u32>> {
        let packets = settle("packets_of", self.president.try_packets_of(user))?;
        Ok(packets.iter().collect())
    }

    fn prompts_of(&self, user: &Address) -> HarnessResult<Vec<u32>> {
        let prompts = settle("prompts_of", self.president.try_prompts_of(user))?;
        Ok(prompts.iter().collect())
    }

    fn cards_of(&self, user: &Address) -> HarnessResult<Vec<ImageId>> {
        let cards = settle("cards_of", self.president.try_cards_of(user))?;
        Ok(cards.iter().map(|card| ImageId(card.to_array())).collect())
    }

    fn balance(&self, user: &Address) -> HarnessResult<i128> {
        settle("balance", self.token.try_balance(user))
    }
}

// Flattens the nested result of a `try_` client call.
fn settle<T, C, E, I>(op: &'static str, outcome: Result<Result<T, C>, Result<E, I>>) -> HarnessResult<T>
where
    C: Debug,
    E: Into<Rejection>,
    I: Debug,
{
    match outcome {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(conversion)) => Err(HarnessError::Conversion {
            op,
            detail: format!("{conversion:?}"),
        }),
        Err(Ok(error)) => Err(HarnessError::Rejected {
            op,
            reason: error.into(),
        }),
        Err(Err(invoke)) => Err(HarnessError::Aborted {
            op,
            detail: format!("{invoke:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use metafusion_president::MetaFusionError;
    use metafusion_president::contract::PACKET_PRICE;

    use super::*;

    #[test]
    fn test_deploy_and_fund() {
        let chain = LocalChain::deploy();
        let user = chain.create_user(5_000_000).unwrap();

        assert_eq!(chain.balance(&user).unwrap(), 5_000_000);
        assert_eq!(chain.balance(&chain.owner()).unwrap(), 0);
        assert!(!chain.collection_exists(1).unwrap());
    }

    #[test]
    fn test_rejections_carry_contract_error() {
        let chain = LocalChain::deploy();
        let user = chain.create_user(10 * PACKET_PRICE).unwrap();

        let refused = chain.forge_collection(&user, 1).unwrap_err();
        assert_eq!(refused.contract_error(), Some(MetaFusionError::NotContractOwner));

        chain.forge_collection(&chain.owner(), 1).unwrap();
        let packet_id = chain.forge_packet(&user, 1, PACKET_PRICE).unwrap();
        assert_eq!(chain.owner_of(&Item::Packet(packet_id)).unwrap(), user);

        let missing = chain.owner_of(&Item::Packet(packet_id + (1 << 16))).unwrap_err();
        assert!(matches!(
            missing,
            HarnessError::Rejected {
                op: "owner_of_packet",
                reason: Rejection::Contract(MetaFusionError::NonExistentPacket),
            }
        ));
    }

    #[test]
    fn test_unfunded_payment_aborts() {
        let chain = LocalChain::deploy();
        let broke = chain.create_user(0).unwrap();
        chain.forge_collection(&chain.owner(), 1).unwrap();

        let error = chain.forge_packet(&broke, 1, PACKET_PRICE).unwrap_err();
        assert_eq!(error.contract_error(), None);
        assert_eq!(chain.packets_of(&broke).unwrap(), Vec::<u32>::new());
    }
}
