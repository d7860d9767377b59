//! Household power balance computation.

/// Sums the rated power of the active devices.
///
/// Inputs follow the production convention:
/// - Negative = consumption (appliances)
/// - Positive = production (solar)
///
/// # Returns
///
/// Net household power in kW (negative = drawing from the grid)
pub fn total_active_kw(active_power_kw: impl IntoIterator<Item = f64>) -> f64 {
    active_power_kw.into_iter().sum()
}

/// Computes the allowed grid draw magnitude.
///
/// # Arguments
///
/// * `max_grid_kw` - Contracted grid limit (positive)
/// * `production_kw` - Rated power of the production device when it is on
pub fn allowed_draw_kw(max_grid_kw: f64, production_kw: Option<f64>) -> f64 {
    max_grid_kw + production_kw.map_or(0.0, f64::abs)
}

/// Returns `true` while consumption stays within the allowed draw.
pub fn within_budget(total_kw: f64, allowed_kw: f64) -> bool {
    total_kw >= -allowed_kw
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_consumption_and_production() {
        let net = total_active_kw([-2.0, -1.5, 1.0]);
        assert!((net - -2.5).abs() < 1e-9);
    }

    #[test]
    fn empty_household_draws_nothing() {
        assert_eq!(total_active_kw(std::iter::empty()), 0.0);
    }

    #[test]
    fn production_raises_allowance() {
        assert_eq!(allowed_draw_kw(3.5, None), 3.5);
        assert_eq!(allowed_draw_kw(3.5, Some(1.5)), 5.0);
        assert_eq!(allowed_draw_kw(3.5, Some(-1.5)), 5.0);
    }

    #[test]
    fn budget_boundary_is_inclusive() {
        assert!(within_budget(-3.5, 3.5));
        assert!(!within_budget(-3.6, 3.5));
        assert!(within_budget(1.0, 3.5));
    }
}
