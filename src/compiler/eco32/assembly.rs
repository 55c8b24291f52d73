use std::fmt::*;

/// A general purpose register, written `$n`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reg(u8);

impl Reg {
    pub const ZERO: Reg = Reg(0);
    pub const FP: Reg = Reg(25);
    pub const SP: Reg = Reg(29);
    pub const RA: Reg = Reg(31);

    /// The first and last register which expressions may be evaluated in.
    pub const FIRST_FREE_USE: u8 = 8;
    pub const LAST_FREE_USE: u8 = 23;

    pub fn new(n: u8) -> Reg {
        Reg(n)
    }

    pub fn number(&self) -> u8 {
        self.0
    }
}

impl Display for Reg {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_fmt(format_args!("${}", self.0))
    }
}

/// The third operand of an arithmetic instruction: either a register or an
/// immediate value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Operand {
    Register(Reg),
    Integer(i32),
}

impl Display for Operand {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        use Operand::*;
        match self {
            Register(reg) => f.write_fmt(format_args!("{}", reg)),
            Integer(i) => f.write_fmt(format_args!("{}", i)),
        }
    }
}

impl From<Reg> for Operand {
    fn from(reg: Reg) -> Self {
        Operand::Register(reg)
    }
}

impl From<i32> for Operand {
    fn from(i: i32) -> Self {
        Operand::Integer(i)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Inst {
    Import(String),
    Export(String),
    Code,
    Align(u32),
    Label(String),

    Add(Reg, Reg, Operand),
    Sub(Reg, Reg, Operand),
    Mul(Reg, Reg, Operand),
    Div(Reg, Reg, Operand),
    And(Reg, Reg, Operand),
    Or(Reg, Reg, Operand),

    Ldw(Reg, Reg, i32),
    Stw(Reg, Reg, i32),

    Beq(Reg, Reg, String),
    Bne(Reg, Reg, String),
    Blt(Reg, Reg, String),
    Ble(Reg, Reg, String),
    Bgt(Reg, Reg, String),
    Bge(Reg, Reg, String),
    Bgeu(Reg, Reg, String),

    J(String),
    Jal(String),
    Jr(Reg),
}

impl Inst {
    /// The three operand form shared by every arithmetic and branch instruction.
    fn three(
        f: &mut Formatter<'_>,
        mnemonic: &str,
        a: &dyn Display,
        b: &dyn Display,
        c: &dyn Display,
    ) -> Result {
        f.write_fmt(format_args!("\t{}\t{},{},{}", mnemonic, a, b, c))
    }
}

impl Display for Inst {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        use Inst::*;
        match self {
            Import(name) => f.write_fmt(format_args!("\t.import\t{}", name)),
            Export(name) => f.write_fmt(format_args!("\t.export\t{}", name)),
            Code => f.write_str("\t.code"),
            Align(n) => f.write_fmt(format_args!("\t.align\t{}", n)),
            Label(lbl) => f.write_fmt(format_args!("{}:", lbl)),

            Add(a, b, c) => Inst::three(f, "add", a, b, c),
            Sub(a, b, c) => Inst::three(f, "sub", a, b, c),
            Mul(a, b, c) => Inst::three(f, "mul", a, b, c),
            Div(a, b, c) => Inst::three(f, "div", a, b, c),
            And(a, b, c) => Inst::three(f, "and", a, b, c),
            Or(a, b, c) => Inst::three(f, "or", a, b, c),

            Ldw(a, b, off) => Inst::three(f, "ldw", a, b, off),
            Stw(a, b, off) => Inst::three(f, "stw", a, b, off),

            Beq(a, b, lbl) => Inst::three(f, "beq", a, b, lbl),
            Bne(a, b, lbl) => Inst::three(f, "bne", a, b, lbl),
            Blt(a, b, lbl) => Inst::three(f, "blt", a, b, lbl),
            Ble(a, b, lbl) => Inst::three(f, "ble", a, b, lbl),
            Bgt(a, b, lbl) => Inst::three(f, "bgt", a, b, lbl),
            Bge(a, b, lbl) => Inst::three(f, "bge", a, b, lbl),
            Bgeu(a, b, lbl) => Inst::three(f, "bgeu", a, b, lbl),

            J(lbl) => f.write_fmt(format_args!("\tj\t{}", lbl)),
            Jal(lbl) => f.write_fmt(format_args!("\tjal\t{}", lbl)),
            Jr(reg) => f.write_fmt(format_args!("\tjr\t{}", reg)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        for (inst, expected) in vec![
            (Inst::Import("printi".into()), "\t.import\tprinti"),
            (Inst::Export("main".into()), "\t.export\tmain"),
            (Inst::Code, "\t.code"),
            (Inst::Align(4), "\t.align\t4"),
            (Inst::Label("L3".into()), "L3:"),
            (Inst::Sub(Reg::SP, Reg::SP, Operand::Integer(16)), "\tsub\t$29,$29,16"),
            (
                Inst::Add(Reg::new(8), Reg::new(8), Reg::new(9).into()),
                "\tadd\t$8,$8,$9",
            ),
            (Inst::Add(Reg::new(8), Reg::FP, Operand::Integer(-4)), "\tadd\t$8,$25,-4"),
            (Inst::Stw(Reg::FP, Reg::SP, 4), "\tstw\t$25,$29,4"),
            (Inst::Ldw(Reg::RA, Reg::FP, -12), "\tldw\t$31,$25,-12"),
            (
                Inst::Bgeu(Reg::new(9), Reg::new(10), "_indexError".into()),
                "\tbgeu\t$9,$10,_indexError",
            ),
            (Inst::J("L0".into()), "\tj\tL0"),
            (Inst::Jal("printi".into()), "\tjal\tprinti"),
            (Inst::Jr(Reg::RA), "\tjr\t$31"),
        ] {
            assert_eq!(inst.to_string(), expected);
        }
    }
}
