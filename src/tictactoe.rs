//! Tic-tac-toe as a game tree.
//!
//! X is the max player and moves first. A finished game is worth +1 if X
//! won, -1 if O won, and 0 for a draw. Node ids are the base-3 encoding of
//! the board, so transpositions share an id.

use std::fmt;

use crate::tree::{Edge, GameTree, Node, NodeId};

/// The eight winning lines.
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    X,
    O,
}

impl Cell {
    fn digit(self) -> u64 {
        match self {
            Cell::Empty => 0,
            Cell::X => 1,
            Cell::O => 2,
        }
    }
}

/// A 3x3 board, cells indexed row by row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    pub cells: [Cell; 9],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [Cell::Empty; 9],
        }
    }

    /// Parse a board from nine characters `X`, `O`, or `.`, row by row.
    /// Whitespace is ignored.
    pub fn parse(s: &str) -> Option<Self> {
        let mut cells = [Cell::Empty; 9];
        let mut n = 0;
        for c in s.chars().filter(|c| !c.is_whitespace()) {
            if n == 9 {
                return None;
            }
            cells[n] = match c {
                'X' | 'x' => Cell::X,
                'O' | 'o' => Cell::O,
                '.' => Cell::Empty,
                _ => return None,
            };
            n += 1;
        }
        (n == 9).then_some(Self { cells })
    }

    /// Side to move. X moves whenever both sides have played equally often.
    pub fn to_move(&self) -> Cell {
        let xs = self.cells.iter().filter(|&&c| c == Cell::X).count();
        let os = self.cells.iter().filter(|&&c| c == Cell::O).count();
        if xs <= os { Cell::X } else { Cell::O }
    }

    pub fn winner(&self) -> Option<Cell> {
        LINES.iter().find_map(|&[a, b, c]| {
            let first = self.cells[a];
            (first != Cell::Empty && first == self.cells[b] && first == self.cells[c])
                .then_some(first)
        })
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|&c| c != Cell::Empty)
    }

    pub fn is_over(&self) -> bool {
        self.winner().is_some() || self.is_full()
    }

    /// Copy of the board with the side to move playing `cell`.
    pub fn play(&self, cell: usize) -> Option<Self> {
        if cell >= 9 || self.cells[cell] != Cell::Empty || self.is_over() {
            return None;
        }
        let mut next = *self;
        next.cells[cell] = self.to_move();
        Some(next)
    }

    pub fn encode(&self) -> u64 {
        self.cells.iter().rev().fold(0, |acc, c| acc * 3 + c.digit())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..3 {
            let line: String = self.cells[row * 3..row * 3 + 3]
                .iter()
                .map(|c| match c {
                    Cell::Empty => '.',
                    Cell::X => 'X',
                    Cell::O => 'O',
                })
                .collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Label of the move at `cell`, e.g. `r0c2`.
pub fn move_label(cell: usize) -> String {
    format!("r{}c{}", cell / 3, cell % 3)
}

/// Game tree over [`Board`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct TicTacToeTree;

impl TicTacToeTree {
    pub fn new() -> Self {
        Self
    }

    /// The empty board with X to move.
    pub fn root(&self) -> Node<Board> {
        self.node_for(Board::new())
    }

    /// Wrap a board in a node of the right kind.
    pub fn node_for(&self, board: Board) -> Node<Board> {
        let id = NodeId(board.encode());
        let max_player = board.to_move() == Cell::X;
        match board.winner() {
            Some(Cell::X) => Node::terminal(id, board, 1.0, max_player),
            Some(_) => Node::terminal(id, board, -1.0, max_player),
            None if board.is_full() => Node::terminal(id, board, 0.0, max_player),
            None => Node::decision(id, board, max_player),
        }
    }
}

impl GameTree for TicTacToeTree {
    type State = Board;

    fn children(&self, node: &Node<Board>) -> Vec<Edge<Board>> {
        if node.is_terminal() {
            return Vec::new();
        }
        (0..9)
            .filter_map(|cell| {
                node.data
                    .play(cell)
                    .map(|next| Edge::new(self.node_for(next), move_label(cell)))
            })
            .collect()
    }
}

/// Static evaluation from X's point of view.
///
/// Terminal nodes return their value. Other positions score every line
/// still open to only one side, which keeps the estimate inside (-1, 1).
pub fn evaluate(node: &Node<Board>) -> f64 {
    if node.is_terminal() {
        return node.terminal_value;
    }
    let cells = &node.data.cells;
    let score: i32 = LINES
        .iter()
        .map(|line| {
            let xs = line.iter().filter(|&&i| cells[i] == Cell::X).count() as i32;
            let os = line.iter().filter(|&&i| cells[i] == Cell::O).count() as i32;
            match (xs, os) {
                (x, 0) => x,
                (0, o) => -o,
                _ => 0,
            }
        })
        .sum();
    f64::from(score) / 32.0
}
