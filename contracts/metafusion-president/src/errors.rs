use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum MetaFusionError {
    /// Only the owner of the contract can forge new collections.
    NotContractOwner = 300,
    /// Indicates the collection was already forged.
    CollectionAlreadyForged = 301,
    /// Indicates a collection that was never forged.
    NonExistentCollection = 302,
    /// Indicates a collection id that does not fit the prompt id layout.
    InvalidCollection = 303,
    /// Indicates the attached payment is below the required fee or price.
    InsufficientPayment = 304,
    /// Indicates a non-existent packet.
    NonExistentPacket = 305,
    /// Indicates the packet was already opened.
    PacketAlreadyOpened = 306,
    /// Indicates an error related to the ownership over a particular asset.
    IncorrectOwner = 307,
    /// Indicates all packet sequences of a collection are already in use.
    PacketIdsDepleted = 308,
    /// Indicates a non-existent prompt.
    NonExistentPrompt = 309,
    /// Indicates a non-existent card.
    NonExistentCard = 310,
    /// Indicates the asset has no open listing.
    NotListed = 311,
    /// Indicates a listing price that is zero or negative.
    InvalidPrice = 312,
    /// Indicates a prompt set of the wrong size or spanning collections.
    InvalidPromptSet = 313,
    /// Indicates an empty slot in the prompt set.
    MissingPrompt = 314,
    /// Indicates a prompt placed in the slot of another type.
    PromptTypeMismatch = 315,
    /// Indicates a buyer trying to buy their own listing.
    SelfPurchase = 316,
    /// Indicates the payment token was never configured.
    UnsetPaymentToken = 317,
}
