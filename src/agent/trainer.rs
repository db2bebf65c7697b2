use super::encoder::states_to_tensor;
use super::replaybuffer::Transition;
use crate::game::{ACTION_SIZE, action_index};
use crate::sequential::{Sequential, tensor::Tensor};

/// Parallel columns of a group of transitions, ready for the network.
pub struct TransitionBatch {
    pub states: Tensor,
    pub actions: Vec<usize>,
    pub rewards: Vec<f32>,
    pub next_states: Tensor,
    pub dones: Vec<bool>
}

impl TransitionBatch {
    pub fn from_transitions<'a>(transitions: impl IntoIterator<Item = &'a Transition>) -> Self {
        let transitions: Vec<&Transition> = transitions.into_iter().collect();

        Self {
            states: states_to_tensor(transitions.iter().map(|t| &t.state)),
            actions: transitions.iter().map(|t| action_index(&t.action)).collect(),
            rewards: transitions.iter().map(|t| t.reward).collect(),
            next_states: states_to_tensor(transitions.iter().map(|t| &t.next_state)),
            dones: transitions.iter().map(|t| t.done).collect()
        }
    }

    pub fn single(transition: &Transition) -> Self {
        Self::from_transitions([transition])
    }

    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }
}

/// Q-learning update. The same network provides the prediction and the bootstrap estimate.
pub struct QTrainer {
    gamma: f32
}

impl QTrainer {
    pub fn new(gamma: f32) -> Self {
        Self { gamma }
    }

    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    /// Returns `(pred, target)`: the network output for `states` and a copy of it
    /// where each row's taken action holds `r` (terminal) or `r + gamma * max Q(next)`.
    pub fn targets(&self, model: &mut Sequential, batch: &TransitionBatch) -> (Tensor, Tensor) {
        let next_max = model.predict(&batch.next_states).max_rows();
        let pred = model.predict(&batch.states);
        let target = pred.deep_clone();

        {
            let mut target_data = target.write();
            for i in 0..batch.len() {
                let q_new = if batch.dones[i] {
                    batch.rewards[i]
                } else {
                    batch.rewards[i] + self.gamma * next_max[i]
                };
                target_data[i * ACTION_SIZE + batch.actions[i]] = q_new;
            }
        }

        (pred, target)
    }

    // one Adam step on the MSE between prediction and Bellman target
    pub fn train_step(&self, model: &mut Sequential, batch: &TransitionBatch) -> f32 {
        let (_, target) = self.targets(model, batch);
        model.train_on_batch(&batch.states, &target)
    }
}
