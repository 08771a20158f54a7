use std::fmt;

/// Outcome of every cylinder query and transfer operation.
///
/// The set is closed: call sites branch on the variant and translate it into a
/// cancel message for the client with [`ReturnValue::message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnValue {
    NoError,
    NotPossible,
    NotEnoughRoom,
    NotEnoughCapacity,
    ContainerNotEnoughRoom,
    CannotPickup,
    NeedExchange,
    NotMoveable,
    DepotIsFull,
    ThisIsImpossible,
    ItemCannotBeMovedHere,
    CannotMoveItemIsNotStoreItem,
    CannotBeDressed,
    PutThisObjectInYourHand,
    PutThisObjectInBothHands,
    BothHandsNeedToBeFree,
    DropTwoHandedItem,
    CanOnlyUseOneWeapon,
    CanOnlyUseOneShield,
    QuiverAmmoOnly,
    NotEnoughMoney,
}

impl ReturnValue {
    pub fn is_ok(self) -> bool {
        self == ReturnValue::NoError
    }

    pub fn message(self) -> &'static str {
        match self {
            ReturnValue::NoError => "",
            ReturnValue::NotPossible => "Sorry, not possible.",
            ReturnValue::NotEnoughRoom => "There is not enough room.",
            ReturnValue::NotEnoughCapacity => "This object is too heavy for you to carry.",
            ReturnValue::ContainerNotEnoughRoom => "You cannot put more objects in this container.",
            ReturnValue::CannotPickup => "You cannot take this object.",
            ReturnValue::NeedExchange => "Sorry, not possible.",
            ReturnValue::NotMoveable => "You cannot move this object.",
            ReturnValue::DepotIsFull => {
                "You cannot put more items in this depot. Please remove some items first."
            }
            ReturnValue::ThisIsImpossible => "This is impossible.",
            ReturnValue::ItemCannotBeMovedHere => "This item cannot be moved there.",
            ReturnValue::CannotMoveItemIsNotStoreItem => {
                "You cannot move this item into your Store inbox as it was not bought in the Store."
            }
            ReturnValue::CannotBeDressed => "You cannot dress this object there.",
            ReturnValue::PutThisObjectInYourHand => "Put this object in your hand.",
            ReturnValue::PutThisObjectInBothHands => "Put this object in both hands.",
            ReturnValue::BothHandsNeedToBeFree => "Both hands need to be free.",
            ReturnValue::DropTwoHandedItem => "Drop the double-handed object first.",
            ReturnValue::CanOnlyUseOneWeapon => "You may only use one weapon.",
            ReturnValue::CanOnlyUseOneShield => "You may use only one shield.",
            ReturnValue::QuiverAmmoOnly => "This quiver only holds arrows and bolts.",
            ReturnValue::NotEnoughMoney => "You do not have enough money.",
        }
    }
}

impl fmt::Display for ReturnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ok() {
            write!(f, "no error")
        } else {
            f.write_str(self.message())
        }
    }
}
