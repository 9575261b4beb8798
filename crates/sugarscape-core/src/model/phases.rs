use super::SugarscapeModel;
use crate::agent::AgentId;
use rand::seq::{IndexedRandom, SliceRandom};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

/// What happened during one tick.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSummary {
    pub tick: usize,
    pub moves: usize,
    pub tech_transfers: usize,
    pub innovations: usize,
    pub deaths: usize,
    pub population: usize,
}

impl SugarscapeModel {
    /// Run one tick: regrow, then move, share, gather, survive and innovate,
    /// each phase over a freshly shuffled live population, then record
    /// metrics.
    pub fn step(&mut self) -> StepSummary {
        self.field.regrow();

        let moves = self.move_phase();
        let tech_transfers = self.share_phase();
        self.gather_phase();
        let deaths = self.survival_phase();
        let innovations = self.innovate_phase();

        self.tick += 1;
        let sample = self.collect_metrics();
        let population = sample.population;
        self.metrics.push(sample);

        if population == 0 && self.running {
            self.running = false;
            info!(tick = self.tick, "Population extinct");
        }
        debug!(
            tick = self.tick,
            moves, tech_transfers, innovations, deaths, population, "Tick complete"
        );
        StepSummary {
            tick: self.tick,
            moves,
            tech_transfers,
            innovations,
            deaths,
            population,
        }
    }

    /// Live agent ids in a fresh random order.
    fn live_order(&mut self) -> Vec<AgentId> {
        let mut order: Vec<AgentId> = self
            .agents
            .iter()
            .filter(|a| a.alive)
            .map(|a| a.id)
            .collect();
        order.shuffle(&mut self.rng);
        order
    }

    pub(crate) fn move_phase(&mut self) -> usize {
        let mut moves = 0;
        for id in self.live_order() {
            let agent = &self.agents[id.0 as usize];
            if !agent.alive {
                continue;
            }
            let from = agent.position;
            let to = agent.choose_destination(&self.grid, &self.field, &mut self.rng);
            if to != from {
                self.grid.relocate(id, from, to);
                self.agents[id.0 as usize].position = to;
                moves += 1;
            }
        }
        moves
    }

    /// Each innovating agent picks one innovating agent in sight (itself
    /// included) and the less advanced of the two climbs one tech level.
    pub(crate) fn share_phase(&mut self) -> usize {
        let mut transfers = 0;
        for id in self.live_order() {
            let agent = &self.agents[id.0 as usize];
            if !agent.alive || !agent.affiliation.is_innovating() {
                continue;
            }
            let candidates: Vec<AgentId> = self
                .grid
                .neighborhood(agent.position, agent.vision, true)
                .into_iter()
                .filter_map(|cell| self.grid.occupant(cell))
                .filter(|other| {
                    let other = &self.agents[other.0 as usize];
                    other.alive && other.affiliation.is_innovating()
                })
                .collect();
            let Some(&partner) = candidates.choose(&mut self.rng) else {
                trace!(agent = %id, "No sharing partner in sight");
                continue;
            };

            let own_tech = agent.tech;
            let partner_tech = self.agents[partner.0 as usize].tech;
            let learner = if partner_tech > own_tech {
                id
            } else if partner_tech < own_tech {
                partner
            } else {
                continue;
            };
            self.agents[learner.0 as usize].update_tech_level(self.rules.reduction_scale);
            transfers += 1;
            trace!(agent = %id, partner = %partner, learner = %learner, "Tech shared");
        }
        transfers
    }

    pub(crate) fn gather_phase(&mut self) {
        for id in self.live_order() {
            let agent = &mut self.agents[id.0 as usize];
            if agent.alive {
                agent.gather_and_eat(&mut self.field);
            }
        }
    }

    pub(crate) fn survival_phase(&mut self) -> usize {
        let mut deaths = 0;
        for id in self.live_order() {
            let agent = &mut self.agents[id.0 as usize];
            if !agent.alive || !agent.is_depleted() {
                continue;
            }
            agent.alive = false;
            self.grid.vacate(agent.position, id);
            deaths += 1;
            trace!(agent = %id, sugar = agent.sugar, "Agent starved");
        }
        self.total_deaths += deaths;
        deaths
    }

    pub(crate) fn innovate_phase(&mut self) -> usize {
        let rules = self.rules;
        let mut innovations = 0;
        for id in self.live_order() {
            let agent = &mut self.agents[id.0 as usize];
            if agent.alive && agent.try_innovate(&rules, &mut self.rng) {
                innovations += 1;
                trace!(agent = %id, tech = agent.tech, "Innovation");
            }
        }
        innovations
    }
}
