//! IO device interface
use crate::constants::*;

/// Hooks to provide IO devices to the virtual machine.
pub trait Devices {
    /// Checks immediately whether the given key is currently pressed.
    fn is_pressed(&self, key: KeyCode) -> bool;

    /// The lowest numbered key that is currently pressed, if any.
    fn first_pressed(&self) -> Option<KeyCode> {
        (0..KEY_COUNT)
            .filter_map(|k| KeyCode::try_from(k).ok())
            .find(|k| self.is_pressed(*k))
    }

    /// The display buffer changed and should be presented.
    fn request_redraw(&mut self);
}

/// Keyboard input state and redraw signal, kept in memory.
///
/// Suitable for hosts that translate their own input events into key
/// presses, and poll for redraws once per frame.
#[derive(Debug, Default, Clone)]
pub struct Keypad {
    /// Pressed is a 1 bit, released is a 0 bit.
    key_state: u16,
    redraw: bool,
}

impl Keypad {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn set_key(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.key_state |= 1 << key.as_u8();
        } else {
            self.key_state &= !(1 << key.as_u8());
        }
    }

    /// Check whether any key is pressed down.
    #[inline(always)]
    pub fn any_key(&self) -> bool {
        self.key_state > 0
    }

    /// Clear the keyboard input state, setting all keys to up.
    #[inline(always)]
    pub fn clear_keys(&mut self) {
        self.key_state = 0;
    }

    /// Returns whether a redraw was requested since the last call.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }
}

impl Devices for Keypad {
    fn is_pressed(&self, key: KeyCode) -> bool {
        self.key_state & (1 << key.as_u8()) > 0
    }

    fn first_pressed(&self) -> Option<KeyCode> {
        if self.any_key() {
            KeyCode::try_from(self.key_state.trailing_zeros() as u8).ok()
        } else {
            None
        }
    }

    fn request_redraw(&mut self) {
        self.redraw = true;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum KeyCode {
    Key0 = 0,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,
    KeyA,
    KeyB,
    KeyC,
    KeyD,
    KeyE,
    KeyF = 0xF,
}

impl KeyCode {
    #[inline(always)]
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

impl std::fmt::Display for KeyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let key_id = self.as_u8();
        write!(f, "k{key_id:x}")
    }
}

impl From<KeyCode> for u8 {
    fn from(keycode: KeyCode) -> Self {
        keycode.as_u8()
    }
}

impl TryFrom<u8> for KeyCode {
    type Error = InvalidKeyCode;

    fn try_from(key_id: u8) -> Result<Self, Self::Error> {
        match key_id {
            0 => Ok(Self::Key0),
            1 => Ok(Self::Key1),
            2 => Ok(Self::Key2),
            3 => Ok(Self::Key3),
            4 => Ok(Self::Key4),
            5 => Ok(Self::Key5),
            6 => Ok(Self::Key6),
            7 => Ok(Self::Key7),
            8 => Ok(Self::Key8),
            9 => Ok(Self::Key9),
            10 => Ok(Self::KeyA),
            11 => Ok(Self::KeyB),
            12 => Ok(Self::KeyC),
            13 => Ok(Self::KeyD),
            14 => Ok(Self::KeyE),
            15 => Ok(Self::KeyF),
            _ => Err(InvalidKeyCode(key_id)),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("keycode must be in range 0 <= keycode < 16, got {0}")]
pub struct InvalidKeyCode(pub u8);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_key_state() {
        let mut keys = Keypad::new();

        keys.set_key(KeyCode::Key0, true);
        assert_eq!(keys.key_state, 0b00000000_00000001);
        assert!(keys.is_pressed(KeyCode::Key0));
        assert!(!keys.is_pressed(KeyCode::Key1));
        assert!(!keys.is_pressed(KeyCode::Key7));

        keys.set_key(KeyCode::Key7, true);
        assert_eq!(keys.key_state, 0b00000000_10000001);
        assert!(keys.is_pressed(KeyCode::Key7));

        keys.set_key(KeyCode::Key0, false);
        assert_eq!(keys.key_state, 0b00000000_10000000);
        assert!(!keys.is_pressed(KeyCode::Key0));

        keys.set_key(KeyCode::KeyF, true);
        assert_eq!(keys.key_state, 0b10000000_10000000);
        assert!(keys.is_pressed(KeyCode::KeyF));
        assert_eq!(keys.first_pressed(), Some(KeyCode::Key7));

        keys.clear_keys();
        assert!(!keys.any_key());
        assert_eq!(keys.first_pressed(), None);
    }

    /// Devices that only answer key queries.
    struct Pressed(&'static [KeyCode]);

    impl Devices for Pressed {
        fn is_pressed(&self, key: KeyCode) -> bool {
            self.0.contains(&key)
        }

        fn request_redraw(&mut self) {}
    }

    #[test]
    fn test_default_first_pressed() {
        assert_eq!(Pressed(&[]).first_pressed(), None);
        assert_eq!(
            Pressed(&[KeyCode::KeyE, KeyCode::Key3, KeyCode::Key9]).first_pressed(),
            Some(KeyCode::Key3)
        );
        assert_eq!(Pressed(&[KeyCode::KeyF]).first_pressed(), Some(KeyCode::KeyF));
    }

    #[test]
    fn test_take_redraw() {
        let mut keys = Keypad::new();
        assert!(!keys.take_redraw());
        keys.request_redraw();
        assert!(keys.take_redraw());
        assert!(!keys.take_redraw());
    }

    #[test]
    fn test_keycode_conversion() {
        assert_eq!(KeyCode::try_from(0xA), Ok(KeyCode::KeyA));
        assert_eq!(KeyCode::try_from(16), Err(InvalidKeyCode(16)));
        assert_eq!(u8::from(KeyCode::KeyF), 15);
        assert_eq!(KeyCode::KeyC.to_string(), "kc");
    }
}
