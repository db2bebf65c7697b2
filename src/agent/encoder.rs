use crate::game::{Direction, Environment};
use crate::sequential::tensor::Tensor;

pub const STATE_SIZE: usize = 11;

/// `[danger straight, right, left; heading left, right, up, down; food left, right, up, down]`
pub type State = [u8; STATE_SIZE];

// state: danger relative to heading, absolute heading, food relative to head
pub fn encode_state<E: Environment + ?Sized>(env: &E) -> State {
    let head = env.head();
    let direction = env.direction();
    let food = env.food();

    let point_l = (head.0 - 1, head.1);
    let point_r = (head.0 + 1, head.1);
    let point_u = (head.0, head.1 - 1);
    let point_d = (head.0, head.1 + 1);

    // (straight, right, left) in absolute points, keyed by heading
    let (ahead, right, left) = match direction {
        Direction::Right => (point_r, point_d, point_u),
        Direction::Down => (point_d, point_l, point_r),
        Direction::Left => (point_l, point_u, point_d),
        Direction::Up => (point_u, point_r, point_l),
    };

    [
        env.is_collision(ahead) as u8,
        env.is_collision(right) as u8,
        env.is_collision(left) as u8,

        (direction == Direction::Left) as u8,
        (direction == Direction::Right) as u8,
        (direction == Direction::Up) as u8,
        (direction == Direction::Down) as u8,

        (food.0 < head.0) as u8,
        (food.0 > head.0) as u8,
        (food.1 < head.1) as u8,
        (food.1 > head.1) as u8,
    ]
}

// stacks states into a [n, STATE_SIZE] network input
pub fn states_to_tensor<'a>(states: impl IntoIterator<Item = &'a State>) -> Tensor {
    let data: Vec<f32> = states.into_iter().flat_map(|state| state.iter().map(|&v| v as f32)).collect();
    let rows = data.len() / STATE_SIZE;
    Tensor::from_vec(data, vec![rows, STATE_SIZE])
}
