/*!
 # ECO32
 ## About
 This module models the subset of the ECO32 assembly language which the code
 generator emits, and the register conventions of the target.

 Every instruction is a value of [`assembly::Inst`]; its `Display` implementation
 writes the line exactly as the ECO32 assembler expects it:

 ```text
 	.export	main
 main:
 	sub	$29,$29,8
 	stw	$25,$29,4
 	add	$25,$29,8
 ```

 ## Registers
 1. `$0` always reads as zero.
 2. `$8` to `$23` are free for expression evaluation.
 3. `$25` is the frame pointer, `$29` the stack pointer and `$31` holds the return
    address after a `jal`.
 */
pub mod assembly;
