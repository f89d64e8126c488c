/*!
 # Packet encoding

 Turns a logical [`Command`] plus the cached [`DeviceState`] into the exact
 bytes a controller of a given [`DeviceFamily`] expects. Encoding is pure
 apart from the state update: no I/O happens here.

 ## Framing

 * Generic: `[method, payload...]`
 * LEDnetWF: `[counter_hi, counter_lo, 0x80, 0x00, 0x00, len, len + 1, group_hi, group_lo, payload..., checksum]`
 * Keepsmile: fixed header and trailer per command, no counter or checksum

 LEDnetWF and Keepsmile only accept mode, speed and brightness together, so
 each of those commands re-sends the two cached values it does not change.
*/

use std::fmt;

use crate::checksum::{checksum, LEDNETWF_CHECKSUM_START};
use crate::color::lednetwf_hsv;
use crate::family::DeviceFamily;
use crate::state::DeviceState;
use crate::{Error, Result};

/// Generic method codes
const GENERIC_RGB: u8 = 0x03;
const GENERIC_SWITCH: u8 = 0x04;
const GENERIC_MODE: u8 = 0x07;
const GENERIC_BRIGHTNESS: u8 = 0x08;
const GENERIC_SPEED: u8 = 0x09;

const LEDNETWF_MARKER: [u8; 3] = [0x80, 0x00, 0x00];
const LEDNETWF_GROUP_COLOR: [u8; 2] = [0x0b, 0x3b];
const LEDNETWF_GROUP_EFFECT: [u8; 2] = [0x0b, 0x38];
const LEDNETWF_COLOR: u8 = 0xa1;
const LEDNETWF_ON: u8 = 0x23;
const LEDNETWF_OFF: u8 = 0x24;

const KEEPSMILE_ON: u8 = 0xf0;
const KEEPSMILE_OFF: u8 = 0x0f;

/// A logical command understood by every family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Static RGB color
    Rgb { red: u8, green: u8, blue: u8 },
    /// Power on (`true`) or off (`false`)
    Switch(bool),
    /// Effect mode
    Mode(u8),
    /// Brightness level
    Brightness(u8),
    /// Effect speed
    Speed(u8),
}

/// A finished, ready-to-send packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet(Vec<u8>);

impl Packet {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for Packet {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Encodes `command` for `family`.
///
/// Mode, brightness and speed are stored in `state` before encoding so the
/// combined packets carry the value just set. LEDnetWF packets advance the
/// sequence counter. Values are written as given, without range checks.
///
/// Returns [`Error::NotConnected`] for [`DeviceFamily::Unknown`].
pub fn encode(family: DeviceFamily, command: &Command, state: &mut DeviceState) -> Result<Packet> {
    if family == DeviceFamily::Unknown {
        return Err(Error::NotConnected);
    }

    state.apply(command);

    let packet = match family {
        DeviceFamily::Generic => encode_generic(command),
        DeviceFamily::LedNetWf => encode_lednetwf(command, state),
        DeviceFamily::Keepsmile => encode_keepsmile(command, state),
        DeviceFamily::Unknown => return Err(Error::NotConnected),
    };
    Ok(packet)
}

fn encode_generic(command: &Command) -> Packet {
    let bytes = match *command {
        Command::Rgb { red, green, blue } => vec![GENERIC_RGB, red, green, blue],
        Command::Switch(on) => vec![GENERIC_SWITCH, u8::from(on)],
        Command::Mode(mode) => vec![GENERIC_MODE, mode],
        Command::Brightness(brightness) => vec![GENERIC_BRIGHTNESS, brightness],
        Command::Speed(speed) => vec![GENERIC_SPEED, speed],
    };
    Packet(bytes)
}

fn encode_lednetwf(command: &Command, state: &mut DeviceState) -> Packet {
    match *command {
        Command::Rgb { red, green, blue } => {
            let hsv = lednetwf_hsv(red, green, blue);
            let mut payload = [0u8; 11];
            payload[..4].copy_from_slice(&[LEDNETWF_COLOR, hsv.hue, hsv.saturation, hsv.value]);
            lednetwf_frame(state, LEDNETWF_GROUP_COLOR, &payload)
        }
        Command::Switch(on) => {
            let mut payload = [0u8; 11];
            payload[0] = if on { LEDNETWF_ON } else { LEDNETWF_OFF };
            lednetwf_frame(state, LEDNETWF_GROUP_COLOR, &payload)
        }
        Command::Mode(_) | Command::Brightness(_) | Command::Speed(_) => {
            let payload = [state.mode, state.speed, state.brightness];
            lednetwf_frame(state, LEDNETWF_GROUP_EFFECT, &payload)
        }
    }
}

/// Wraps a LEDnetWF payload with counter, marker, length bytes and checksum
fn lednetwf_frame(state: &mut DeviceState, group: [u8; 2], payload: &[u8]) -> Packet {
    let counter = state.next_counter();
    let length = (group.len() + payload.len()) as u8;

    let mut bytes = Vec::with_capacity(LEDNETWF_CHECKSUM_START + payload.len() + 1);
    bytes.extend_from_slice(&counter.to_be_bytes());
    bytes.extend_from_slice(&LEDNETWF_MARKER);
    bytes.push(length);
    bytes.push(length.wrapping_add(1));
    bytes.extend_from_slice(&group);
    bytes.extend_from_slice(payload);
    bytes.push(0);

    let last = bytes.len() - 1;
    bytes[last] = checksum(&bytes, LEDNETWF_CHECKSUM_START);
    Packet(bytes)
}

fn encode_keepsmile(command: &Command, state: &DeviceState) -> Packet {
    let bytes = match *command {
        Command::Rgb { red, green, blue } => vec![
            0x5a,
            0x00,
            0x01,
            red,
            green,
            blue,
            0x00,
            state.brightness,
            0x00,
            0xa5,
        ],
        Command::Switch(on) => vec![
            0x5b,
            if on { KEEPSMILE_ON } else { KEEPSMILE_OFF },
            0x00,
            0xb5,
        ],
        Command::Mode(_) | Command::Brightness(_) | Command::Speed(_) => vec![
            0x5c,
            0x00,
            state.mode.wrapping_add(128),
            state.speed,
            state.brightness,
            0x00,
            0xc5,
        ],
    };
    Packet(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn encode_fresh(family: DeviceFamily, command: Command) -> Vec<u8> {
        let mut state = DeviceState::default();
        encode(family, &command, &mut state).unwrap().into_vec()
    }

    #[rstest]
    #[case(Command::Rgb { red: 1, green: 2, blue: 3 }, vec![0x03, 1, 2, 3])]
    #[case(Command::Switch(true), vec![0x04, 0x01])]
    #[case(Command::Switch(false), vec![0x04, 0x00])]
    #[case(Command::Mode(6), vec![0x07, 6])]
    #[case(Command::Brightness(42), vec![0x08, 42])]
    #[case(Command::Speed(77), vec![0x09, 77])]
    fn generic_packets(#[case] command: Command, #[case] expected: Vec<u8>) {
        assert_eq!(encode_fresh(DeviceFamily::Generic, command), expected);
    }

    #[test]
    fn generic_has_no_counter() {
        let mut state = DeviceState::default();
        encode(DeviceFamily::Generic, &Command::Switch(true), &mut state).unwrap();
        encode(DeviceFamily::Generic, &Command::Brightness(3), &mut state).unwrap();
        assert_eq!(state.counter, 0);
        assert_eq!(state.brightness, 3);
    }

    #[test]
    fn lednetwf_color_packet() {
        let packet = encode_fresh(
            DeviceFamily::LedNetWf,
            Command::Rgb {
                red: 255,
                green: 0,
                blue: 0,
            },
        );
        assert_eq!(
            packet,
            vec![
                0x00, 0x01, 0x80, 0x00, 0x00, 0x0d, 0x0e, 0x0b, 0x3b, 0xa1, 0x3c, 0x64, 0x64,
                0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xa5,
            ]
        );
    }

    #[rstest]
    #[case(true, 0x23)]
    #[case(false, 0x24)]
    fn lednetwf_switch_packet(#[case] on: bool, #[case] code: u8) {
        let packet = encode_fresh(DeviceFamily::LedNetWf, Command::Switch(on));
        let mut expected = vec![0x00, 0x01, 0x80, 0x00, 0x00, 0x0d, 0x0e, 0x0b, 0x3b, code];
        expected.extend_from_slice(&[0x00; 10]);
        expected.push(code);
        assert_eq!(packet, expected);
    }

    #[test]
    fn lednetwf_brightness_is_combined() {
        let packet = encode_fresh(DeviceFamily::LedNetWf, Command::Brightness(50));
        assert_eq!(
            packet,
            vec![0x00, 0x01, 0x80, 0x00, 0x00, 0x05, 0x06, 0x0b, 0x38, 0x01, 0x64, 0x32, 0x97]
        );
    }

    #[test]
    fn lednetwf_checksum_covers_payload() {
        let mut state = DeviceState::default();
        let commands = [
            Command::Rgb {
                red: 12,
                green: 200,
                blue: 99,
            },
            Command::Switch(false),
            Command::Mode(9),
            Command::Speed(255),
            Command::Brightness(250),
        ];
        for command in commands {
            let packet = encode(DeviceFamily::LedNetWf, &command, &mut state).unwrap();
            let bytes = packet.as_bytes();
            let last = bytes.len() - 1;
            let sum = bytes[9..last]
                .iter()
                .fold(0u8, |acc, &byte| acc.wrapping_add(byte));
            assert_eq!(bytes[last], sum, "checksum of {command:?}");
            assert_eq!(bytes[5] as usize, last - 7, "length of {command:?}");
            assert_eq!(bytes[6], bytes[5] + 1);
        }
    }

    #[test]
    fn lednetwf_counter_increases_and_wraps() {
        let mut state = DeviceState {
            counter: 0xfffe,
            ..DeviceState::default()
        };
        let counters: Vec<[u8; 2]> = (0..3)
            .map(|_| {
                let packet =
                    encode(DeviceFamily::LedNetWf, &Command::Switch(true), &mut state).unwrap();
                [packet.as_bytes()[0], packet.as_bytes()[1]]
            })
            .collect();
        assert_eq!(counters, vec![[0xff, 0xff], [0x00, 0x00], [0x00, 0x01]]);
    }

    #[rstest]
    #[case(DeviceFamily::LedNetWf)]
    #[case(DeviceFamily::Keepsmile)]
    fn combined_payload_keeps_stale_fields(#[case] family: DeviceFamily) {
        let mut state = DeviceState::default();
        encode(family, &Command::Mode(4), &mut state).unwrap();
        encode(family, &Command::Brightness(30), &mut state).unwrap();
        let packet = encode(family, &Command::Speed(60), &mut state).unwrap();
        let bytes = packet.as_bytes();

        match family {
            DeviceFamily::LedNetWf => assert_eq!(&bytes[9..12], &[4, 60, 30]),
            _ => assert_eq!(bytes, &[0x5c, 0x00, 4 + 128, 60, 30, 0x00, 0xc5]),
        }
    }

    #[test]
    fn keepsmile_color_uses_cached_brightness() {
        let mut state = DeviceState::default();
        encode(DeviceFamily::Keepsmile, &Command::Brightness(20), &mut state).unwrap();
        let packet = encode(
            DeviceFamily::Keepsmile,
            &Command::Rgb {
                red: 10,
                green: 20,
                blue: 30,
            },
            &mut state,
        )
        .unwrap();
        assert_eq!(
            packet.into_vec(),
            vec![0x5a, 0x00, 0x01, 10, 20, 30, 0x00, 20, 0x00, 0xa5]
        );
    }

    #[rstest]
    #[case(true, vec![0x5b, 0xf0, 0x00, 0xb5])]
    #[case(false, vec![0x5b, 0x0f, 0x00, 0xb5])]
    fn keepsmile_switch_packet(#[case] on: bool, #[case] expected: Vec<u8>) {
        assert_eq!(
            encode_fresh(DeviceFamily::Keepsmile, Command::Switch(on)),
            expected
        );
    }

    #[test]
    fn keepsmile_mode_wraps_instead_of_overflowing() {
        let packet = encode_fresh(DeviceFamily::Keepsmile, Command::Mode(200));
        assert_eq!(packet[2], 200u8.wrapping_add(128));
    }

    #[test]
    fn keepsmile_has_no_counter() {
        let mut state = DeviceState::default();
        encode(DeviceFamily::Keepsmile, &Command::Switch(true), &mut state).unwrap();
        assert_eq!(state.counter, 0);
    }

    #[rstest]
    #[case(DeviceFamily::Generic)]
    #[case(DeviceFamily::LedNetWf)]
    #[case(DeviceFamily::Keepsmile)]
    fn encoding_is_deterministic(#[case] family: DeviceFamily) {
        let command = Command::Rgb {
            red: 1,
            green: 128,
            blue: 255,
        };
        let mut first = DeviceState::default();
        let mut second = DeviceState::default();
        assert_eq!(
            encode(family, &command, &mut first).unwrap(),
            encode(family, &command, &mut second).unwrap()
        );
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_family_is_not_connected() {
        let mut state = DeviceState::default();
        assert_matches!(
            encode(DeviceFamily::Unknown, &Command::Brightness(10), &mut state),
            Err(Error::NotConnected)
        );
        assert_eq!(state, DeviceState::default());
    }

    #[test]
    fn packet_displays_as_hex() {
        let packet = encode_fresh(DeviceFamily::Keepsmile, Command::Switch(true));
        let packet = Packet(packet);
        assert_eq!(packet.to_string(), "5b f0 00 b5");
    }
}
