use uuid::{Uuid, uuid};

use crate::position::ClosurePercent;

pub const WRITE_CHARACTERISTIC_UUID: Uuid = uuid!("cba20002-224d-11e6-9fb8-0002a5d5c51b");

pub const POSITION_COMMAND_LEN: usize = 7;

const COMMAND_MAGIC: u8 = 0x57;
const COMMAND_TYPE_EXTENDED: u8 = 0x0f;
const CURTAIN_OPERATION: u8 = 0x45;
const CURTAIN_MODE_POSITION: u8 = 0x01;
const CURTAIN_SPEED: u8 = 0x05;
const CURTAIN_ALL_MOTORS: u8 = 0xff;

/// Command moving a curtain to `closure` percent closed.
///
/// Layout: `[0x57, 0x0f, 0x45, 0x01, 0x05, 0xff, position]`.
pub fn position_command(closure: ClosurePercent) -> [u8; POSITION_COMMAND_LEN] {
    [
        COMMAND_MAGIC,
        COMMAND_TYPE_EXTENDED,
        CURTAIN_OPERATION,
        CURTAIN_MODE_POSITION,
        CURTAIN_SPEED,
        CURTAIN_ALL_MOTORS,
        closure.value(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_position_in_last_byte() {
        let closure = ClosurePercent::new(73).unwrap();

        assert_eq!(
            position_command(closure),
            [0x57, 0x0f, 0x45, 0x01, 0x05, 0xff, 73]
        );
    }

    #[test]
    fn encodes_bounds() {
        assert_eq!(position_command(ClosurePercent::OPEN)[6], 0);
        assert_eq!(position_command(ClosurePercent::CLOSED)[6], 100);
    }

    #[test]
    fn characteristic_uuid_matches_curtain_service() {
        assert_eq!(
            WRITE_CHARACTERISTIC_UUID.to_string(),
            "cba20002-224d-11e6-9fb8-0002a5d5c51b"
        );
    }
}
