//! Native call dispatch.
//!
//! `invoke` walks the call signature once to build a `NativeFrame`, calls the
//! host, then copies every output slot back into the managed argument vector.
//! Nothing reaches the host until every argument has been marshaled, so a
//! marshaling error never leaves a half-built call behind.

use sampbridge_hostapi::{NativeAddress, NativeArg, NativeFrame, NativeHost};
use sampbridge_primitives::types::{
    bool_to_cell, bytes_to_cells, cell_to_float, cells_to_bytes, float_to_cell,
};
use sampbridge_primitives::{ArgCode, ArgKind, ArgumentDescriptor, CallSignature, Cell, SizeSpec, Value};

use crate::codepage::Codepage;
use crate::error::BridgeError;

/// Largest buffer, in cells, a resolved size may request.
pub const MAX_BUFFER_CELLS: usize = 1 << 20;

/// Call limits and string translation for one dispatch.
#[derive(Debug, Clone, Copy)]
pub struct DispatchContext<'a> {
    pub codepage: &'a Codepage,
    pub max_args: usize,
}

/// Marshal `args`, call `native` and copy outputs back into `args`.
///
/// `sizes` gives the managed length of each `a`, `S` and `A` slot, in order.
/// Output slots are written back whatever the native returned.
pub fn invoke<H: NativeHost + ?Sized>(
    host: &mut H,
    native: NativeAddress,
    signature: &CallSignature,
    args: &mut [Value],
    sizes: Option<&[i32]>,
    ctx: DispatchContext<'_>,
) -> Result<Cell, BridgeError> {
    let descriptors = signature.descriptors();
    let codes = signature.arg_codes();
    if args.len() != descriptors.len() {
        return Err(BridgeError::ArgumentCountMismatch {
            expected: descriptors.len(),
            got: args.len(),
        });
    }
    if codes.len() != args.len() {
        return Err(BridgeError::ArgumentCountMismatch {
            expected: codes.len(),
            got: args.len(),
        });
    }
    if args.len() > ctx.max_args {
        return Err(BridgeError::TooManyArguments {
            got: args.len(),
            max: ctx.max_args,
        });
    }

    let mut frame = NativeFrame::with_capacity(args.len());
    let mut managed_lens = Vec::with_capacity(args.len());
    let mut sizes = SizeCursor::new(sizes);

    for (index, ((desc, &code), value)) in descriptors.iter().zip(codes).zip(args.iter()).enumerate() {
        let native_len = resolve_size(index, desc, &frame)?;
        let managed_len = match (code, native_len) {
            (ArgCode::IntArray | ArgCode::StrRef | ArgCode::IntArrayRef, Some(n)) => {
                Some(sizes.next(index, n)?)
            }
            _ => native_len,
        };
        frame.push(marshal(index, desc, code, value, native_len, managed_len, ctx.codepage)?);
        managed_lens.push(managed_len);
    }

    let result = host.invoke_native(native, &mut frame);

    for (index, (arg, desc)) in frame.into_args().into_iter().zip(descriptors).enumerate() {
        if desc.direction().is_output() {
            args[index] = unmarshal(arg, codes[index], managed_lens[index], ctx.codepage);
        }
    }
    Ok(result)
}

/// Walks the caller's `sizes` array.
struct SizeCursor<'a> {
    sizes: Option<&'a [i32]>,
    next: usize,
}

impl<'a> SizeCursor<'a> {
    fn new(sizes: Option<&'a [i32]>) -> Self {
        Self { sizes, next: 0 }
    }

    fn next(&mut self, index: usize, native_len: usize) -> Result<usize, BridgeError> {
        let Some(sizes) = self.sizes else {
            return Ok(native_len);
        };
        let Some(&size) = sizes.get(self.next) else {
            return Err(size_error(index, format!("no entry {} in sizes", self.next)));
        };
        self.next += 1;
        if size < 0 || size as usize > native_len {
            return Err(size_error(
                index,
                format!("managed size {size} outside 0..={native_len}"),
            ));
        }
        Ok(size as usize)
    }
}

fn size_error(index: usize, reason: String) -> BridgeError {
    BridgeError::SizeResolution { index, reason }
}

/// Resolve the native buffer size of argument `index`.
///
/// `[*K]` reads the marshaled cell of argument K, which must come before
/// `index` and be a scalar.
fn resolve_size(
    index: usize,
    desc: &ArgumentDescriptor,
    frame: &NativeFrame,
) -> Result<Option<usize>, BridgeError> {
    let len = match desc.size() {
        SizeSpec::None => return Ok(None),
        SizeSpec::Fixed(n) => n,
        SizeSpec::ArgIndexed(k) => {
            if k == 0 || k > index {
                return Err(size_error(
                    index,
                    format!("[*{k}] does not name an earlier argument"),
                ));
            }
            let cell = frame
                .cell(k - 1)
                .ok_or_else(|| size_error(index, format!("argument {k} is not a scalar")))?;
            if cell < 0 {
                return Err(size_error(index, format!("argument {k} is negative ({cell})")));
            }
            cell as usize
        }
    };
    if len > MAX_BUFFER_CELLS {
        return Err(size_error(index, format!("{len} cells exceeds {MAX_BUFFER_CELLS}")));
    }
    Ok(Some(len))
}

fn type_error(index: usize, desc: &ArgumentDescriptor, code: ArgCode, value: &Value) -> BridgeError {
    BridgeError::ArgumentType {
        index,
        code: code.as_char(),
        kind: desc.kind().letter(),
        found: value.type_name(),
    }
}

fn marshal(
    index: usize,
    desc: &ArgumentDescriptor,
    code: ArgCode,
    value: &Value,
    native_len: Option<usize>,
    managed_len: Option<usize>,
    codepage: &Codepage,
) -> Result<NativeArg, BridgeError> {
    let kind = desc.kind();
    if !code.accepts(kind) {
        return Err(type_error(index, desc, code, value));
    }
    if value.is_null() && !desc.direction().is_output() {
        return Err(BridgeError::NullArgument {
            index,
            kind: kind.letter(),
        });
    }

    let arg = match kind {
        ArgKind::Int | ArgKind::Float => NativeArg::Value(scalar_cell(index, desc, code, value)?),
        ArgKind::Bool => {
            let cell = scalar_cell(index, desc, code, value)?;
            NativeArg::Value(bool_to_cell(cell != 0))
        }
        ArgKind::ConstRef => NativeArg::Ref(scalar_cell(index, desc, code, value)?),
        ArgKind::MutRef => match value {
            Value::Null => NativeArg::RefMut(0),
            _ => NativeArg::RefMut(scalar_cell(index, desc, code, value)?),
        },
        ArgKind::ConstString => {
            let text = value.as_str().ok_or_else(|| type_error(index, desc, code, value))?;
            // input-only, so a size suffix never truncates it
            NativeArg::Str(bytes_to_cells(&codepage.encode(text)).into_boxed_slice())
        }
        ArgKind::MutString => {
            let len = required_len(index, native_len)?;
            let bytes = match value {
                Value::Null => Vec::new(),
                Value::Str(text) => codepage.encode(text),
                _ => return Err(type_error(index, desc, code, value)),
            };
            NativeArg::StrMut(string_buffer(&bytes, len))
        }
        ArgKind::ConstArray => {
            let len = required_len(index, native_len)?;
            let input = value
                .as_int_array()
                .ok_or_else(|| type_error(index, desc, code, value))?;
            let take = managed_len.unwrap_or(len).min(input.len());
            let mut cells = vec![0; len];
            cells[..take].copy_from_slice(&input[..take]);
            NativeArg::Array(cells.into_boxed_slice())
        }
        ArgKind::MutArray => {
            let len = required_len(index, native_len)?;
            let mut cells = vec![i32::MIN; len];
            match value {
                Value::Null => {}
                Value::IntArray(input) => {
                    let take = len.min(input.len());
                    cells[..take].copy_from_slice(&input[..take]);
                }
                _ => return Err(type_error(index, desc, code, value)),
            }
            NativeArg::ArrayMut(cells)
        }
    };
    Ok(arg)
}

fn required_len(index: usize, native_len: Option<usize>) -> Result<usize, BridgeError> {
    native_len.ok_or_else(|| size_error(index, "buffer argument has no size".to_string()))
}

/// The cell for a scalar slot, checked against its transfer code.
fn scalar_cell(
    index: usize,
    desc: &ArgumentDescriptor,
    code: ArgCode,
    value: &Value,
) -> Result<Cell, BridgeError> {
    match (code, value) {
        (ArgCode::Int | ArgCode::IntRef, Value::Int(v)) => Ok(*v),
        (ArgCode::Float | ArgCode::FloatRef, Value::Float(v)) => Ok(float_to_cell(*v)),
        (ArgCode::Bool, Value::Bool(v)) => Ok(bool_to_cell(*v)),
        _ => Err(type_error(index, desc, code, value)),
    }
}

/// A zero-filled buffer of `len` cells holding as much of `bytes` as fits
/// before a terminator.
fn string_buffer(bytes: &[u8], len: usize) -> Vec<Cell> {
    let mut cells = vec![0; len];
    let take = bytes.len().min(len.saturating_sub(1));
    for (dst, &b) in cells.iter_mut().zip(&bytes[..take]) {
        *dst = b as Cell;
    }
    cells
}

fn unmarshal(arg: NativeArg, code: ArgCode, managed_len: Option<usize>, codepage: &Codepage) -> Value {
    match arg {
        NativeArg::RefMut(cell) => match code {
            ArgCode::FloatRef => Value::Float(cell_to_float(cell)),
            _ => Value::Int(cell),
        },
        NativeArg::StrMut(buf) => {
            let len = managed_len.unwrap_or(buf.len()).min(buf.len());
            Value::Str(codepage.decode(&cells_to_bytes(&buf[..len])))
        }
        NativeArg::ArrayMut(mut buf) => {
            buf.truncate(managed_len.unwrap_or(buf.len()));
            Value::IntArray(buf)
        }
        NativeArg::Value(cell) | NativeArg::Ref(cell) => Value::Int(cell),
        NativeArg::Str(buf) => Value::Str(codepage.decode(&cells_to_bytes(&buf))),
        NativeArg::Array(buf) => Value::IntArray(buf.into_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sampbridge_hostapi::MemHost;

    fn call(
        host: &mut MemHost,
        name: &str,
        native_format: &str,
        args_format: &str,
        args: &mut [Value],
        sizes: Option<&[i32]>,
    ) -> Result<Cell, BridgeError> {
        let codepage = Codepage::cp1252();
        let address = host.find_native(name).expect("native registered");
        let signature = CallSignature::parse(native_format, args_format)?;
        let ctx = DispatchContext {
            codepage: &codepage,
            max_args: 32,
        };
        invoke(host, address, &signature, args, sizes, ctx)
    }

    #[test]
    fn test_scalars_marshal_as_cells() {
        let mut host = MemHost::new().with_native("SetPlayerPos", |_| 1);
        let mut args = vec![Value::Int(3), Value::Float(1.5), Value::Bool(true)];
        let result = call(&mut host, "SetPlayerPos", "ifb", "dfb", &mut args, None).unwrap();
        assert_eq!(result, 1);
        let sent = &host.calls()[0].args;
        assert_eq!(sent[0], NativeArg::Value(3));
        assert_eq!(sent[1], NativeArg::Value(float_to_cell(1.5)));
        assert_eq!(sent[2], NativeArg::Value(1));
    }

    #[test]
    fn test_int_code_into_bool_is_normalized() {
        let mut host = MemHost::new().with_native("TogglePlayerControllable", |_| 1);
        let mut args = vec![Value::Int(0), Value::Int(42)];
        call(&mut host, "TogglePlayerControllable", "ib", "dd", &mut args, None).unwrap();
        assert_eq!(host.calls()[0].args[1], NativeArg::Value(1));
    }

    #[test]
    fn test_mut_ref_roundtrip() {
        let mut host = MemHost::new().with_native("GetPlayerHealth", |frame| {
            *frame.cell_mut(1).unwrap() = float_to_cell(75.0);
            1
        });
        let mut args = vec![Value::Int(0), Value::Null];
        call(&mut host, "GetPlayerHealth", "iR", "dF", &mut args, None).unwrap();
        assert_eq!(args[1], Value::Float(75.0));
        assert_eq!(host.calls()[0].args[1], NativeArg::RefMut(0));
    }

    #[test]
    fn test_const_string_is_unpacked_and_untouched() {
        let mut host = MemHost::new().with_native("SendRconCommand", |frame| {
            frame.string_bytes(0).map(|b| b.len() as Cell).unwrap_or(-1)
        });
        let mut args = vec![Value::from("gmx")];
        let result = call(&mut host, "SendRconCommand", "s", "s", &mut args, None).unwrap();
        assert_eq!(result, 3);
        assert_eq!(args[0], Value::from("gmx"));
        assert_eq!(
            host.calls()[0].args[0],
            NativeArg::Str(vec![103, 109, 120, 0].into_boxed_slice())
        );
    }

    #[test]
    fn test_mut_string_sized_by_earlier_arg() {
        let mut host = MemHost::new().with_native("GetPlayerName", |frame| {
            frame.write_string(2, b"Player_One");
            10
        });
        let mut args = vec![Value::Int(0), Value::Int(24), Value::Null];
        call(&mut host, "GetPlayerName", "iiS[*2]", "ddS", &mut args, Some(&[24])).unwrap();
        assert_eq!(args[2], Value::from("Player_One"));
        match &host.calls()[0].args[2] {
            NativeArg::StrMut(buf) => assert_eq!(buf.len(), 24),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_const_string_ignores_size_suffix() {
        let mut host = MemHost::new().with_native("Echo", |_| 0);
        let hello = vec![104, 101, 108, 108, 111, 0].into_boxed_slice();

        let mut args = vec![Value::Int(0), Value::from("hello")];
        call(&mut host, "Echo", "is[*1]", "ds", &mut args, None).unwrap();
        assert_eq!(host.calls()[0].args[1], NativeArg::Str(hello.clone()));

        let mut args = vec![Value::from("hello")];
        call(&mut host, "Echo", "s[3]", "s", &mut args, None).unwrap();
        assert_eq!(host.calls()[1].args[0], NativeArg::Str(hello));
        assert_eq!(args[0], Value::from("hello"));
    }

    #[test]
    fn test_arg_indexed_size_reads_marshaled_value() {
        let mut host = MemHost::new().with_native("Echo", |_| 0);
        let mut args = vec![Value::Bool(true), Value::IntArray(vec![7, 8, 9])];
        call(&mut host, "Echo", "ba[*1]", "ba", &mut args, None).unwrap();
        assert_eq!(host.calls()[0].args[1], NativeArg::Array(vec![7].into_boxed_slice()));
    }

    #[test]
    fn test_forward_size_reference_rejected() {
        let mut host = MemHost::new().with_native("Echo", |_| 0);
        let mut args = vec![Value::Null, Value::Int(4)];
        let err = call(&mut host, "Echo", "S[*2]i", "Sd", &mut args, None).unwrap_err();
        assert!(matches!(err, BridgeError::SizeResolution { index: 0, .. }));
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_size_from_buffer_argument_rejected() {
        let mut host = MemHost::new().with_native("Echo", |_| 0);
        let mut args = vec![Value::from("x"), Value::IntArray(vec![1])];
        let err = call(&mut host, "Echo", "sa[*1]", "sa", &mut args, None).unwrap_err();
        assert!(matches!(err, BridgeError::SizeResolution { index: 1, .. }));
    }

    #[test]
    fn test_negative_size_rejected() {
        let mut host = MemHost::new().with_native("Echo", |_| 0);
        let mut args = vec![Value::Int(-1), Value::Null];
        let err = call(&mut host, "Echo", "iA[*1]", "dA", &mut args, None).unwrap_err();
        assert!(matches!(err, BridgeError::SizeResolution { index: 1, .. }));
    }

    #[test]
    fn test_mut_array_prefilled_and_copied_back() {
        let mut host = MemHost::new().with_native("GetPlayerWeaponData", |frame| {
            frame.buffer_mut(1).unwrap()[0] = 31;
            1
        });
        let mut args = vec![Value::Int(0), Value::Null];
        call(&mut host, "GetPlayerWeaponData", "iA[3]", "dA", &mut args, Some(&[2])).unwrap();
        assert_eq!(
            host.calls()[0].args[1],
            NativeArg::ArrayMut(vec![i32::MIN, i32::MIN, i32::MIN])
        );
        assert_eq!(args[1], Value::IntArray(vec![31, i32::MIN]));
    }

    #[test]
    fn test_outputs_written_back_on_failure_code() {
        let mut host = MemHost::new().with_native("GetPlayerIp", |frame| {
            frame.write_string(1, b"0.0.0.0");
            0
        });
        let mut args = vec![Value::Int(5), Value::Null];
        let result = call(&mut host, "GetPlayerIp", "iS[16]", "dS", &mut args, None).unwrap();
        assert_eq!(result, 0);
        assert_eq!(args[1], Value::from("0.0.0.0"));
    }

    #[test]
    fn test_sizes_exhausted() {
        let mut host = MemHost::new().with_native("Echo", |_| 0);
        let mut args = vec![Value::Null, Value::Null];
        let err = call(&mut host, "Echo", "S[4]A[4]", "SA", &mut args, Some(&[4])).unwrap_err();
        assert!(matches!(err, BridgeError::SizeResolution { index: 1, .. }));
    }

    #[test]
    fn test_managed_size_above_native_rejected() {
        let mut host = MemHost::new().with_native("Echo", |_| 0);
        let mut args = vec![Value::Null];
        let err = call(&mut host, "Echo", "S[4]", "S", &mut args, Some(&[5])).unwrap_err();
        assert!(matches!(err, BridgeError::SizeResolution { index: 0, .. }));
    }

    #[test]
    fn test_oversized_buffer_rejected() {
        let mut host = MemHost::new().with_native("Echo", |_| 0);
        let mut args = vec![Value::Int(i32::MAX), Value::Null];
        let err = call(&mut host, "Echo", "iS[*1]", "dS", &mut args, None).unwrap_err();
        assert!(matches!(err, BridgeError::SizeResolution { index: 1, .. }));
    }

    #[test]
    fn test_null_input_rejected_before_call() {
        let mut host = MemHost::new().with_native("Echo", |_| 0);
        let mut args = vec![Value::Int(1), Value::Null];
        let err = call(&mut host, "Echo", "is", "ds", &mut args, None).unwrap_err();
        assert!(matches!(err, BridgeError::NullArgument { index: 1, kind: 's' }));
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_transfer_code_mismatch() {
        let mut host = MemHost::new().with_native("Echo", |_| 0);
        let mut args = vec![Value::Int(1)];
        let err = call(&mut host, "Echo", "s", "d", &mut args, None).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::ArgumentType { index: 0, code: 'd', kind: 's', .. }
        ));

        let mut args = vec![Value::Float(1.0)];
        let err = call(&mut host, "Echo", "i", "d", &mut args, None).unwrap_err();
        assert!(matches!(err, BridgeError::ArgumentType { found: "float", .. }));
    }

    #[test]
    fn test_count_mismatch() {
        let mut host = MemHost::new().with_native("Echo", |_| 0);
        let mut args = vec![Value::Int(1)];
        let err = call(&mut host, "Echo", "ii", "dd", &mut args, None).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::ArgumentCountMismatch { expected: 2, got: 1 }
        ));
        let err = call(&mut host, "Echo", "i", "dd", &mut args, None).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::ArgumentCountMismatch { expected: 2, got: 1 }
        ));
    }

    #[test]
    fn test_too_many_arguments() {
        let mut host = MemHost::new().with_native("Echo", |_| 0);
        let address = host.find_native("Echo").unwrap();
        let signature = CallSignature::parse(&"i".repeat(33), &"d".repeat(33)).unwrap();
        let mut args = vec![Value::Int(0); 33];
        let codepage = Codepage::cp1252();
        let ctx = DispatchContext {
            codepage: &codepage,
            max_args: 32,
        };
        let err = invoke(&mut host, address, &signature, &mut args, None, ctx).unwrap_err();
        assert!(matches!(err, BridgeError::TooManyArguments { got: 33, max: 32 }));
    }

    #[test]
    fn test_strings_use_codepage() {
        let mut host = MemHost::new().with_native("GetName", |frame| {
            frame.write_string(0, &[0x80, b'5']);
            1
        });
        let mut args = vec![Value::Null];
        call(&mut host, "GetName", "S[8]", "S", &mut args, None).unwrap();
        assert_eq!(args[0], Value::from("€5"));
    }
}
