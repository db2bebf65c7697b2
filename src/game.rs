use std::collections::VecDeque;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

use crate::config::GameConfig;

pub type Point = (i32, i32);

// one-hot [straight, turn right, turn left]
pub type Action = [u8; 3];

pub const ACTION_SIZE: usize = 3;

pub const REWARD_FOOD: f32 = 10.0;
pub const REWARD_DEATH: f32 = -10.0;

// a game is cut off once frames exceed this many per snake segment
const FRAMES_PER_SEGMENT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Right,
    Down,
    Left,
    Up
}

impl Direction {
    pub const CLOCKWISE: [Direction; 4] = [Direction::Right, Direction::Down, Direction::Left, Direction::Up];

    // unit vector, y grows downwards
    pub fn offset(self) -> Point {
        match self {
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Up => (0, -1),
        }
    }

    pub fn turn_right(self) -> Direction {
        Self::CLOCKWISE[(self.index() + 1) % 4]
    }

    pub fn turn_left(self) -> Direction {
        Self::CLOCKWISE[(self.index() + 3) % 4]
    }

    fn index(self) -> usize {
        self as usize
    }
}

pub fn action_from_index(index: usize) -> Action {
    let mut action = [0; ACTION_SIZE];
    action[index] = 1;
    action
}

// first position holding the largest entry, like argmax on a one-hot vector
pub fn action_index(action: &Action) -> usize {
    action.iter()
        .enumerate()
        .fold((0, 0), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
        .0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub reward: f32,
    pub done: bool,
    pub score: u32
}

/// What the agent needs from a game: step semantics plus enough of the world
/// to build its state vector.
pub trait Environment {
    fn reset(&mut self);
    fn play_step(&mut self, action: Action) -> StepOutcome;
    fn head(&self) -> Point;
    fn direction(&self) -> Direction;
    fn food(&self) -> Point;
    fn is_collision(&self, point: Point) -> bool;
}

pub struct SnakeGame {
    snake: VecDeque<Point>, // head at the front
    direction: Direction,
    food: Point,
    score: u32,
    frame_iteration: usize,

    width: i32,
    height: i32,
    rng: StdRng
}

impl SnakeGame {
    pub fn new(config: GameConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: GameConfig, rng: StdRng) -> Self {
        assert!(config.width >= 3 && config.height >= 1, "grid too small for the starting snake");
        let mut instance = Self {
            snake: VecDeque::new(),
            direction: Direction::Right,
            food: (0, 0),
            score: 0,
            frame_iteration: 0,
            width: config.width,
            height: config.height,
            rng
        };
        instance.reset();

        instance
    }

    pub fn snake(&self) -> &VecDeque<Point> {&self.snake}
    pub fn score(&self) -> u32 {self.score}

    // food goes on a uniformly chosen free cell; a full board leaves it where it was
    fn place_food(&mut self) {
        let free_cells: Vec<Point> = (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| (x, y)))
            .filter(|cell| !self.snake.contains(cell))
            .collect();

        if let Some(&cell) = free_cells.choose(&mut self.rng) {
            self.food = cell;
        }
    }

    fn check_wall_collision(&self, cell: Point) -> bool {
        cell.0 < 0 || cell.0 >= self.width || cell.1 < 0 || cell.1 >= self.height
    }

    fn apply_action(&mut self, action: Action) {
        self.direction = match action_index(&action) {
            0 => self.direction,
            1 => self.direction.turn_right(),
            _ => self.direction.turn_left(),
        };

        let head = self.head();
        let (dx, dy) = self.direction.offset();
        self.snake.push_front((head.0 + dx, head.1 + dy));
    }
}

impl Environment for SnakeGame {
    fn reset(&mut self) {
        let head = (self.width / 2, self.height / 2);

        self.direction = Direction::Right;
        self.snake = VecDeque::from(vec![head, (head.0 - 1, head.1), (head.0 - 2, head.1)]);
        self.score = 0;
        self.frame_iteration = 0;
        self.place_food();
    }

    // +10 for food, -10 for dying or stalling, 0 otherwise
    fn play_step(&mut self, action: Action) -> StepOutcome {
        self.frame_iteration += 1;
        self.apply_action(action);

        if self.is_collision(self.head()) || self.frame_iteration > FRAMES_PER_SEGMENT * self.snake.len() {
            return StepOutcome { reward: REWARD_DEATH, done: true, score: self.score };
        }

        let reward = if self.head() == self.food {
            self.score += 1;
            self.place_food();
            REWARD_FOOD
        } else {
            self.snake.pop_back();
            0.0
        };

        StepOutcome { reward, done: false, score: self.score }
    }

    fn head(&self) -> Point {
        self.snake[0]
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn food(&self) -> Point {
        self.food
    }

    // walls, or any body segment behind the head
    fn is_collision(&self, point: Point) -> bool {
        self.check_wall_collision(point) || self.snake.iter().skip(1).any(|&segment| segment == point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game() -> SnakeGame {
        SnakeGame::with_seed(GameConfig { width: 10, height: 10 }, 42)
    }

    #[test]
    fn test_reset_layout() {
        let game = game();

        assert_eq!(game.snake().iter().copied().collect::<Vec<_>>(), vec![(5, 5), (4, 5), (3, 5)]);
        assert_eq!(game.direction(), Direction::Right);
        assert!(!game.snake().contains(&game.food()));
    }

    #[test]
    fn test_turns_follow_clockwise_order() {
        assert_eq!(Direction::Right.turn_right(), Direction::Down);
        assert_eq!(Direction::Up.turn_right(), Direction::Right);
        assert_eq!(Direction::Right.turn_left(), Direction::Up);
        assert_eq!(Direction::Down.turn_left(), Direction::Right);
    }

    #[test]
    fn test_action_index_round_trip() {
        for i in 0..ACTION_SIZE {
            assert_eq!(action_index(&action_from_index(i)), i);
        }
        assert_eq!(action_index(&[0, 0, 0]), 0);
    }

    #[test]
    fn test_step_ate_food_reward() {
        let mut game = game();
        game.food = (6, 5);

        let outcome = game.play_step([1, 0, 0]);

        assert_eq!(outcome, StepOutcome { reward: REWARD_FOOD, done: false, score: 1 });
        assert_eq!(game.score(), 1);
        assert_eq!(game.snake().len(), 4);
    }

    #[test]
    fn test_step_plain_move_keeps_length() {
        let mut game = game();
        game.food = (0, 0);

        // right turn from heading right moves down
        let outcome = game.play_step([0, 1, 0]);

        assert_eq!(outcome.reward, 0.0);
        assert!(!outcome.done);
        assert_eq!(game.head(), (5, 6));
        assert_eq!(game.direction(), Direction::Down);
        assert_eq!(game.snake().len(), 3);
    }

    #[test]
    fn test_step_death_penalty() {
        let mut game = SnakeGame::with_seed(GameConfig { width: 3, height: 3 }, 1);
        game.food = (0, 0);

        // head starts at (1, 1) facing right, the wall is two steps away
        assert!(!game.play_step([1, 0, 0]).done);
        let outcome = game.play_step([1, 0, 0]);

        assert_eq!(outcome.reward, REWARD_DEATH);
        assert!(outcome.done);
    }

    #[test]
    fn test_stalling_ends_game() {
        let mut game = game();
        game.food = (0, 0);

        // circle in place: right turns trace a 2x2 loop
        let mut outcome = game.play_step([0, 1, 0]);
        let mut steps = 1;
        while !outcome.done {
            outcome = game.play_step([0, 1, 0]);
            steps += 1;
        }

        assert_eq!(outcome.reward, REWARD_DEATH);
        assert_eq!(steps, FRAMES_PER_SEGMENT * 4 + 1);
    }

    #[test]
    fn test_is_collision_ignores_head() {
        let game = game();

        assert!(!game.is_collision((5, 5)));
        assert!(game.is_collision((4, 5)));
        assert!(game.is_collision((-1, 5)));
        assert!(game.is_collision((5, 10)));
        assert!(!game.is_collision((6, 5)));
    }
}
