use log::debug;

use crate::pa_interface::{Mobility, Vector};

/// Node that stays where it was last put
#[derive(Debug, Clone, Default)]
pub struct ConstantPositionMobility {
    position: Vector,
}

impl ConstantPositionMobility {
    pub fn new(position: Vector) -> Self {
        debug!("initial position {}", position);
        Self { position }
    }
}

impl Mobility for ConstantPositionMobility {
    fn position(&self) -> Vector {
        self.position
    }

    fn set_position(&mut self, position: Vector) {
        self.position = position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut node = ConstantPositionMobility::new(Vector::new(5.0, 0.0, 0.0));
        assert_eq!(node.position(), Vector::new(5.0, 0.0, 0.0));

        node.set_position(Vector::new(6.0, 1.0, 0.0));
        assert_eq!(node.position().x, 6.0);
        assert_eq!(node.position().y, 1.0);
    }
}
