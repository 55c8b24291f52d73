/**
 * RegisterStack hands out a bank of scratch registers in stack order.  This is used
 * by the code generator to evaluate expressions: evaluating an operand pushes the
 * next free register, and combining two operands pops the most recent one.  It is
 * meant to be independent of specific CPU architectures; registers are identified by
 * their number and the target decides how to name them.
 *
 * There is no spilling: when the bank is exhausted `push` returns `None`.
 */
#[derive(Clone, Debug, PartialEq)]
pub struct RegisterStack {
    first: u8,
    last: u8,
    next: u8,
    high_water: usize,
}

impl RegisterStack {
    /// Creates a stack over the registers `first..=last`.
    pub fn new(first: u8, last: u8) -> RegisterStack {
        RegisterStack {
            first,
            last,
            next: first,
            high_water: 0,
        }
    }

    /// Reserves the next free register.
    pub fn push(&mut self) -> Option<u8> {
        if self.next > self.last {
            None
        } else {
            let reg = self.next;
            self.next += 1;
            self.high_water = self.high_water.max(self.live());
            Some(reg)
        }
    }

    /// Releases the most recently reserved register.
    pub fn pop(&mut self) -> Option<u8> {
        if self.next == self.first {
            None
        } else {
            self.next -= 1;
            Some(self.next)
        }
    }

    /// Number of registers currently reserved.
    pub fn live(&self) -> usize {
        (self.next - self.first) as usize
    }

    /// Largest number of registers that were reserved at the same time.
    pub fn high_water(&self) -> usize {
        self.high_water
    }
}
