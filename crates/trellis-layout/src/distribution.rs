// crates/trellis-layout/src/distribution.rs
//! Splits the along-axis space of a line among its slots.
//!
//! Proportional slots share a budget by weight, non-proportional slots keep their requested
//! size, then slots left below their minimum steal from slots with slack. Whatever cannot be
//! resolved that way is fixed by shrinking everything uniformly.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use tracing::debug;

const EPSILON: f32 = 1e-6;

/// One column of a line as seen by the distribution pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub proportion: u16,
    pub priority: u8,
    pub min: f32,
    /// Size requested when `proportion` is 0.
    pub preferred: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisLimits {
    pub soft: f32,
    pub hard: f32,
    /// Scrollable containers are not bound by `hard` along this axis.
    pub scrollable: bool,
}

/// Space moved from `donor` to `thief`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Steal {
    pub thief: usize,
    pub donor: usize,
    pub amount: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Distribution {
    /// Final along-axis size of every slot.
    pub sizes: Vec<f32>,
    /// Sizes right after the proportional split, before any stealing.
    pub initial_sizes: Vec<f32>,
    /// Space handed to proportional slots.
    pub budget: f32,
    /// Margins are multiplied by this; below 1 when the hard limit cannot hold them.
    pub margin_factor: f32,
    pub steals: Vec<Steal>,
    /// Some slot stayed below its minimum after stealing.
    pub unresolved: bool,
}

impl Distribution {
    pub fn total(&self) -> f32 {
        self.sizes.iter().sum()
    }
}

/// Distributes space along one axis. `margins` is the total margin of the line, edge
/// margins included.
pub fn distribute(slots: &[Slot], margins: f32, limits: AxisLimits) -> Distribution {
    if slots.is_empty() {
        return Distribution {
            margin_factor: 1.0,
            ..Default::default()
        };
    }

    let hard = if limits.scrollable { f32::MAX } else { limits.hard };

    let mut total_proportion: u32 = 0;
    let mut min_total = 0.0f32;
    let mut non_proportional = 0.0f32;
    let mut proportional_floor = 0.0f32;
    for slot in slots {
        min_total += slot.min;
        if slot.proportion > 0 {
            total_proportion += slot.proportion as u32;
            proportional_floor += slot.min;
        } else {
            non_proportional += slot.preferred;
        }
    }

    // Margins give way before content does.
    let margin_space = (hard - min_total).clamp(0.0, margins.max(0.0));
    let margin_factor = if margins > EPSILON {
        margin_space / margins
    } else {
        1.0
    };
    let applied_margins = margins * margin_factor;

    let mut budget = (limits.soft - margins - non_proportional).max(proportional_floor);
    if !limits.scrollable {
        budget = budget.min(hard - applied_margins - non_proportional);
    }
    let budget = budget.max(0.0);

    let available = (hard - applied_margins).max(0.0);
    let non_proportional_scale = if !limits.scrollable && non_proportional > available {
        available / non_proportional
    } else {
        1.0
    };

    let mut sizes: Vec<f32> = slots
        .iter()
        .map(|slot| {
            if slot.proportion > 0 {
                slot.proportion as f32 * budget / total_proportion as f32
            } else {
                slot.preferred * non_proportional_scale
            }
        })
        .collect();
    let initial_sizes = sizes.clone();

    let mut thieves = Vec::new();
    let mut donors = BinaryHeap::new();
    for (index, (slot, size)) in slots.iter().zip(&sizes).enumerate() {
        if *size > slot.min {
            donors.push(Reverse((slot.priority, index)));
        } else if slot.min - *size > EPSILON {
            thieves.push(index);
        }
    }

    let mut steals = Vec::new();
    let mut unresolved = false;

    if !thieves.is_empty() {
        // Low priority deficits are settled first, from the lowest priority donors that are
        // still eligible. Donors below the current thief can never serve a later thief.
        thieves.sort_by_key(|&index| (slots[index].priority, index));

        for thief in thieves {
            let thief_priority = slots[thief].priority;
            let mut missing = slots[thief].min - sizes[thief];

            while missing > EPSILON {
                let Some(&Reverse((donor_priority, donor))) = donors.peek() else {
                    break;
                };
                if donor_priority < thief_priority {
                    donors.pop();
                    continue;
                }

                let excess = sizes[donor] - slots[donor].min;
                let amount = excess.min(missing);
                sizes[donor] -= amount;
                sizes[thief] += amount;
                missing -= amount;
                steals.push(Steal { thief, donor, amount });

                if excess - amount <= EPSILON {
                    donors.pop();
                } else {
                    missing = 0.0;
                }
            }

            if missing > EPSILON {
                unresolved = true;
            }
        }
    }

    // Only ever shrinks: the ratio is at most 1.
    if unresolved && !limits.scrollable {
        let total: f32 = sizes.iter().sum();
        if total > available && total > 0.0 {
            let ratio = available / total;
            debug!("Unresolved line overflow, shrinking all cells by {:.3}", ratio);
            for size in &mut sizes {
                *size *= ratio;
            }
        }
    }

    Distribution {
        sizes,
        initial_sizes,
        budget,
        margin_factor,
        steals,
        unresolved,
    }
}
