use std::fmt;

/// The 16-bit opcode code-points of the compiled-script instruction set.
///
/// The numbering is dictated by the external compiler: the interpreter core
/// ops live in the 0x80xx range, literal pushes carry a type tag in the high
/// byte (0x9001 string, 0xA001 float, 0xC001 int) followed by a 32-bit
/// big-endian immediate. Every other opcode takes its operands from the data
/// stack. Code-points with no entry in the handler table fault as
/// `UnknownOpcode` at dispatch, never at load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Opcode {
    Noop = 0x8000,
    CriticalStart = 0x8002,
    CriticalDone = 0x8003,
    Jmp = 0x8004,
    Call = 0x8005,
    /// Move the top of the return stack onto the data stack.
    AToD = 0x800C,
    /// Move the top of the data stack onto the return stack.
    DToA = 0x800D,
    Exit = 0x8010,
    FetchLocal = 0x8012,
    StoreLocal = 0x8013,
    FetchDvar = 0x8014,
    StoreDvar = 0x8015,
    ExportVar = 0x8016,
    Swap = 0x8018,
    SwapA = 0x8019,
    Pop = 0x801A,
    Dup = 0x801B,
    PopReturn = 0x801C,
    CheckArgCount = 0x8027,
    LookupProc = 0x8028,
    PopBase = 0x8029,
    PopToBase = 0x802A,
    PushBase = 0x802B,
    IfThen = 0x802F,
    While = 0x8030,
    Eq = 0x8033,
    Neq = 0x8034,
    Le = 0x8035,
    Ge = 0x8036,
    Lt = 0x8037,
    Gt = 0x8038,
    Add = 0x8039,
    Sub = 0x803A,
    Mul = 0x803B,
    Div = 0x803C,
    Mod = 0x803D,
    And = 0x803E,
    Or = 0x803F,
    Bwand = 0x8040,
    Bwor = 0x8041,
    Bwxor = 0x8042,
    Bwnot = 0x8043,
    Floor = 0x8044,
    Not = 0x8045,
    Negate = 0x8046,

    // host-serviced engine ops
    GiveExpPoints = 0x80A1,
    Random = 0x80B4,
    MoveTo = 0x80B6,
    CreateObject = 0x80B7,
    DisplayMsg = 0x80B8,
    ScriptOverrides = 0x80B9,
    SelfObj = 0x80BC,
    SourceObj = 0x80BD,
    TargetObj = 0x80BE,
    DudeObj = 0x80BF,
    LocalVar = 0x80C1,
    SetLocalVar = 0x80C2,
    MapVar = 0x80C3,
    SetMapVar = 0x80C4,
    GlobalVar = 0x80C5,
    SetGlobalVar = 0x80C6,
    GetCritterStat = 0x80CA,
    AddTimerEvent = 0x80D4,
    RmTimerEvent = 0x80D5,
    FloatMsg = 0x810A,
    GsayStart = 0x811C,
    GsayEnd = 0x811D,
    GsayReply = 0x811E,
    GsayMessage = 0x8120,
    GiqOption = 0x8121,

    // literals; each is followed by a 32-bit big-endian immediate
    PushString = 0x9001,
    PushFloat = 0xA001,
    PushInt = 0xC001,
}

impl Opcode {
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Whether this opcode carries a 32-bit inline immediate.
    pub fn has_immediate(self) -> bool {
        matches!(self, Opcode::PushString | Opcode::PushFloat | Opcode::PushInt)
    }

    pub fn decode(code: u16) -> Option<Opcode> {
        use Opcode::*;
        Some(match code {
            0x8000 => Noop,
            0x8002 => CriticalStart,
            0x8003 => CriticalDone,
            0x8004 => Jmp,
            0x8005 => Call,
            0x800C => AToD,
            0x800D => DToA,
            0x8010 => Exit,
            0x8012 => FetchLocal,
            0x8013 => StoreLocal,
            0x8014 => FetchDvar,
            0x8015 => StoreDvar,
            0x8016 => ExportVar,
            0x8018 => Swap,
            0x8019 => SwapA,
            0x801A => Pop,
            0x801B => Dup,
            0x801C => PopReturn,
            0x8027 => CheckArgCount,
            0x8028 => LookupProc,
            0x8029 => PopBase,
            0x802A => PopToBase,
            0x802B => PushBase,
            0x802F => IfThen,
            0x8030 => While,
            0x8033 => Eq,
            0x8034 => Neq,
            0x8035 => Le,
            0x8036 => Ge,
            0x8037 => Lt,
            0x8038 => Gt,
            0x8039 => Add,
            0x803A => Sub,
            0x803B => Mul,
            0x803C => Div,
            0x803D => Mod,
            0x803E => And,
            0x803F => Or,
            0x8040 => Bwand,
            0x8041 => Bwor,
            0x8042 => Bwxor,
            0x8043 => Bwnot,
            0x8044 => Floor,
            0x8045 => Not,
            0x8046 => Negate,
            0x80A1 => GiveExpPoints,
            0x80B4 => Random,
            0x80B6 => MoveTo,
            0x80B7 => CreateObject,
            0x80B8 => DisplayMsg,
            0x80B9 => ScriptOverrides,
            0x80BC => SelfObj,
            0x80BD => SourceObj,
            0x80BE => TargetObj,
            0x80BF => DudeObj,
            0x80C1 => LocalVar,
            0x80C2 => SetLocalVar,
            0x80C3 => MapVar,
            0x80C4 => SetMapVar,
            0x80C5 => GlobalVar,
            0x80C6 => SetGlobalVar,
            0x80CA => GetCritterStat,
            0x80D4 => AddTimerEvent,
            0x80D5 => RmTimerEvent,
            0x810A => FloatMsg,
            0x811C => GsayStart,
            0x811D => GsayEnd,
            0x811E => GsayReply,
            0x8120 => GsayMessage,
            0x8121 => GiqOption,
            0x9001 => PushString,
            0xA001 => PushFloat,
            0xC001 => PushInt,
            _ => return None,
        })
    }

    pub fn mnemonic(self) -> &'static str {
        use Opcode::*;
        match self {
            Noop => "noop",
            CriticalStart => "critical_start",
            CriticalDone => "critical_done",
            Jmp => "jmp",
            Call => "call",
            AToD => "a_to_d",
            DToA => "d_to_a",
            Exit => "exit_prog",
            FetchLocal => "fetch",
            StoreLocal => "store",
            FetchDvar => "fetch_dvar",
            StoreDvar => "store_dvar",
            ExportVar => "export_var",
            Swap => "swap",
            SwapA => "swapa",
            Pop => "pop",
            Dup => "dup",
            PopReturn => "pop_return",
            CheckArgCount => "check_arg_count",
            LookupProc => "lookup_proc",
            PopBase => "pop_base",
            PopToBase => "pop_to_base",
            PushBase => "push_base",
            IfThen => "if",
            While => "while",
            Eq => "eq",
            Neq => "neq",
            Le => "le",
            Ge => "ge",
            Lt => "lt",
            Gt => "gt",
            Add => "add",
            Sub => "sub",
            Mul => "mul",
            Div => "div",
            Mod => "mod",
            And => "and",
            Or => "or",
            Bwand => "bwand",
            Bwor => "bwor",
            Bwxor => "bwxor",
            Bwnot => "bwnot",
            Floor => "floor",
            Not => "not",
            Negate => "negate",
            GiveExpPoints => "give_exp_points",
            Random => "random",
            MoveTo => "move_to",
            CreateObject => "create_object",
            DisplayMsg => "display_msg",
            ScriptOverrides => "script_overrides",
            SelfObj => "self_obj",
            SourceObj => "source_obj",
            TargetObj => "target_obj",
            DudeObj => "dude_obj",
            LocalVar => "local_var",
            SetLocalVar => "set_local_var",
            MapVar => "map_var",
            SetMapVar => "set_map_var",
            GlobalVar => "global_var",
            SetGlobalVar => "set_global_var",
            GetCritterStat => "get_critter_stat",
            AddTimerEvent => "add_timer_event",
            RmTimerEvent => "rm_timer_event",
            FloatMsg => "float_msg",
            GsayStart => "gsay_start",
            GsayEnd => "gsay_end",
            GsayReply => "gsay_reply",
            GsayMessage => "gsay_message",
            GiqOption => "giq_option",
            PushString => "push_string",
            PushFloat => "push_float",
            PushInt => "push_int",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_round_trips() {
        for code in 0x8000..=0xC010u16 {
            if let Some(op) = Opcode::decode(code) {
                assert_eq!(op.code(), code);
            }
        }
    }

    #[test]
    fn unknown_code_points_do_not_decode() {
        assert_eq!(Opcode::decode(0x0000), None);
        assert_eq!(Opcode::decode(0x8001), None);
        assert_eq!(Opcode::decode(0xFFFF), None);
    }
}
