pub mod config;
pub mod executions;
pub mod nodes;
pub mod run;
pub mod schedule;
pub mod script;
pub mod status;
pub mod worker;

use shell_core::ExecutionRecord;

/// Human-readable view of an execution record.
pub fn print_execution(record: &ExecutionRecord) {
    println!("Execution:  {}", record.id);
    println!("  Script:   {} ({})", record.script_name, record.script_id);
    println!("  Node:     {} ({})", record.node.name, record.node.node_type);
    println!("  Status:   {} ({})", record.status, record.status.label());
    if let Some(at) = record.executed_at {
        println!("  Executed: {}", at);
    }
    if let Some(secs) = record.execution_time {
        println!("  Duration: {:.3}s", secs);
    }
    if let Some(code) = record.exit_code {
        println!("  Exit:     {}", code);
    }
    if let Some(ref result) = record.result {
        println!("  Result:");
        for line in result.lines() {
            println!("    {}", line);
        }
    }
}
