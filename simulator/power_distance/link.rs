// AP -> STA delivery odds

use pa_rust::pa_interface::{PowerDbm, Vector};

use super::config::LinkConfig;
use super::modes::WifiMode;

pub struct LinkModel {
    config: LinkConfig,
}

impl LinkModel {
    pub fn new(config: LinkConfig) -> Self {
        Self { config }
    }

    pub fn path_loss(&self, from: &Vector, to: &Vector) -> f64 {
        let distance = from.distance(to).max(1.0);
        self.config.reference_loss + 10.0 * self.config.path_loss_exponent * distance.log10()
    }

    pub fn snr(&self, power: PowerDbm, from: &Vector, to: &Vector) -> f64 {
        power - self.path_loss(from, to) - self.config.noise_floor
    }

    /// Chance that one attempt in `mode` is received
    pub fn success_probability(
        &self,
        mode: &WifiMode,
        power: PowerDbm,
        from: &Vector,
        to: &Vector,
    ) -> f64 {
        let margin = self.snr(power, from, to) - mode.min_snr;
        1.0 / (1.0 + (-margin * self.config.steepness).exp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::power_distance::modes::erp_mode_list;

    fn origin() -> Vector {
        Vector::new(0.0, 0.0, 0.0)
    }

    #[test]
    fn test_path_loss_grows_with_distance() {
        let link = LinkModel::new(LinkConfig::default());
        let near = link.path_loss(&origin(), &Vector::new(1.0, 0.0, 0.0));
        let far = link.path_loss(&origin(), &Vector::new(10.0, 0.0, 0.0));
        assert!((near - 46.6777).abs() < 1e-9);
        assert!((far - near - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_probability_bounds() {
        let link = LinkModel::new(LinkConfig::default());
        let modes = erp_mode_list();
        let fast = &modes[11];

        let close = link.success_probability(fast, 20.0, &origin(), &Vector::new(5.0, 0.0, 0.0));
        let far = link.success_probability(fast, 20.0, &origin(), &Vector::new(500.0, 0.0, 0.0));
        assert!(close > 0.99);
        assert!(far < 0.01);
    }

    #[test]
    fn test_slow_modes_reach_further() {
        let link = LinkModel::new(LinkConfig::default());
        let modes = erp_mode_list();
        let sta = Vector::new(80.0, 0.0, 0.0);

        let slow = link.success_probability(&modes[0], 20.0, &origin(), &sta);
        let fast = link.success_probability(&modes[11], 20.0, &origin(), &sta);
        assert!(slow > fast);
    }

    #[test]
    fn test_more_power_helps() {
        let link = LinkModel::new(LinkConfig::default());
        let modes = erp_mode_list();
        let sta = Vector::new(60.0, 0.0, 0.0);

        let low = link.success_probability(&modes[8], 0.0, &origin(), &sta);
        let high = link.success_probability(&modes[8], 17.0, &origin(), &sta);
        assert!(high > low);
    }
}
